//! The navigation bar shown at the top of every page, and at the bottom on
//! small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Where a link goes in the mobile bottom bar.
#[derive(Clone, Copy, PartialEq)]
enum Placement {
    /// Always visible.
    Primary,
    /// Inside the "More" menu.
    More,
}

struct NavLink {
    url: &'static str,
    title: &'static str,
    placement: Placement,
}

const fn nav_link(url: &'static str, title: &'static str, placement: Placement) -> NavLink {
    NavLink {
        url,
        title,
        placement,
    }
}

static NAV_LINKS: [NavLink; 9] = [
    nav_link(endpoints::DASHBOARD_VIEW, "Dashboard", Placement::Primary),
    nav_link(endpoints::TRANSACTIONS_VIEW, "Transactions", Placement::Primary),
    nav_link(endpoints::BUDGETS_VIEW, "Budgets", Placement::Primary),
    nav_link(endpoints::GOAL_VIEW, "Goal", Placement::More),
    nav_link(endpoints::REPORTS_VIEW, "Reports", Placement::More),
    nav_link(endpoints::ASSISTANT_VIEW, "Assistant", Placement::More),
    nav_link(endpoints::LEARN_VIEW, "Learn", Placement::More),
    nav_link(endpoints::ACCOUNT_VIEW, "Account", Placement::More),
    nav_link(endpoints::LOG_OUT, "Log out", Placement::More),
];

const DESKTOP_LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm \
    hover:bg-gray-100 lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 \
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 \
    lg:dark:hover:bg-transparent";
const DESKTOP_CURRENT_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 \
    rounded-sm lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white \
    lg:dark:text-blue-500";

const BOTTOM_ITEM_STYLE: &str = "flex w-full min-w-0 items-center justify-center \
    rounded-lg px-2.5 py-2 text-xs font-semibold leading-tight sm:px-4 sm:text-sm";
const BOTTOM_IDLE_STYLE: &str = "text-gray-600 hover:bg-blue-50/70 hover:text-blue-700 \
    dark:text-gray-300 dark:hover:bg-blue-900/20 dark:hover:text-blue-200";
const BOTTOM_CURRENT_STYLE: &str = "bg-blue-50 text-blue-700 shadow-sm \
    dark:bg-blue-900/30 dark:text-blue-200";

const MORE_ITEM_STYLE: &str = "block rounded-lg px-3 py-2 text-gray-700 hover:bg-gray-100 \
    hover:text-blue-700 dark:text-gray-200 dark:hover:bg-gray-800/80 dark:hover:text-blue-200";
const MORE_CURRENT_ITEM_STYLE: &str = "block rounded-lg bg-blue-50 px-3 py-2 text-blue-700 \
    dark:bg-blue-900/30 dark:text-blue-200";

fn bottom_item_style(is_current: bool) -> String {
    let state = if is_current {
        BOTTOM_CURRENT_STYLE
    } else {
        BOTTOM_IDLE_STYLE
    };

    format!("{BOTTOM_ITEM_STYLE} {state}")
}

/// The navigation bar for a page.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl<'a> NavBar<'a> {
    /// The link whose URL equals `active_endpoint` is highlighted.
    pub fn new(active_endpoint: &'a str) -> Self {
        Self { active_endpoint }
    }

    fn is_current(&self, link: &NavLink) -> bool {
        link.url != endpoints::LOG_OUT && link.url == self.active_endpoint
    }

    fn links_in(&self, placement: Placement) -> impl Iterator<Item = (&'static NavLink, bool)> {
        NAV_LINKS
            .iter()
            .filter(move |link| link.placement == placement)
            .map(|link| (link, self.is_current(link)))
    }

    fn desktop_html(&self) -> Markup {
        html! {
            div class="hidden w-full lg:block lg:w-auto"
            {
                ul class="font-medium flex flex-col p-4 lg:p-0 mt-4 border border-gray-100
                    rounded bg-gray-50 lg:flex-row lg:space-x-8 lg:mt-0 lg:border-0
                    lg:bg-white dark:bg-gray-800 lg:dark:bg-gray-900 dark:border-gray-700"
                {
                    @for link in &NAV_LINKS {
                        @let is_current = self.is_current(link);
                        li {
                            a
                                href=(link.url)
                                class=(if is_current { DESKTOP_CURRENT_LINK_STYLE } else { DESKTOP_LINK_STYLE })
                                aria-current=[is_current.then_some("page")]
                            { (link.title) }
                        }
                    }
                }
            }
        }
    }

    fn bottom_bar_html(&self) -> Markup {
        let more_is_current = self.links_in(Placement::More).any(|(_, is_current)| is_current);

        html! {
            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    ul
                        class="grid grid-cols-4 gap-2 px-4 py-3 rounded-xl border border-gray-200
                            bg-white/95 shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                        aria-label="Primary"
                    {
                        @for (link, is_current) in self.links_in(Placement::Primary) {
                            li class="min-w-0" {
                                a
                                    href=(link.url)
                                    class=(bottom_item_style(is_current))
                                    aria-current=[is_current.then_some("page")]
                                { span class="truncate" { (link.title) } }
                            }
                        }

                        li class="min-w-0" {
                            details class="group relative"
                            {
                                summary
                                    class={ "list-none cursor-pointer " (bottom_item_style(more_is_current)) }
                                    aria-current=[more_is_current.then_some("page")]
                                { span class="truncate" { "More" } }

                                ul class="absolute bottom-full right-0 mb-3 w-40 flex flex-col gap-1
                                    rounded-xl border border-gray-200 bg-white/95 p-2 text-sm
                                    font-medium shadow-xl dark:border-gray-700 dark:bg-gray-900/95"
                                {
                                    @for (link, is_current) in self.links_in(Placement::More) {
                                        li {
                                            a
                                                href=(link.url)
                                                class=(if is_current { MORE_CURRENT_ITEM_STYLE } else { MORE_ITEM_STYLE })
                                                aria-current=[is_current.then_some("page")]
                                            { (link.title) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Render the top bar and the mobile bottom bar.
    pub fn into_html(self) -> Markup {
        html! {
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center space-x-3"
                    {
                        img src="/static/favicon-128x128.png" alt="FinDice Logo" class="h-8";
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        { "FinDice" }
                    }

                    (self.desktop_html())
                }
            }

            (self.bottom_bar_html())
        }
    }
}
