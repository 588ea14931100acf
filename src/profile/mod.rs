//! The user's profile: base income, account details and the bank link status.

mod account_page;
mod core;

pub use account_page::{get_account_page, update_profile_endpoint};
pub use core::{
    create_profile, create_profile_table, get_profile_or_default, set_bank_access_token,
    set_bank_last_import,
};

#[cfg(test)]
pub use core::get_profile;
