//! A static page with short lessons on managing money.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

struct Lesson {
    id: &'static str,
    title: &'static str,
    paragraphs: &'static [&'static str],
    tips: &'static [&'static str],
}

const LESSONS: &[Lesson] = &[
    Lesson {
        id: "budgeting",
        title: "Budgeting basics",
        paragraphs: &[
            "A budget is a plan for where your money goes before you spend it. \
            Start with your monthly income and subtract the things you must pay, \
            such as rent and groceries. What is left is what you can choose to \
            spend or save.",
            "A common starting point is the 50/30/20 rule: half of your income for \
            needs, 30% for wants and 20% for savings or paying down debt.",
        ],
        tips: &[
            "Set a budget for each month on the Budgets page.",
            "Check your progress bar halfway through the month.",
            "If you go over, look at which category grew and adjust next month.",
        ],
    },
    Lesson {
        id: "tracking",
        title: "Tracking your spending",
        paragraphs: &[
            "You cannot improve what you do not measure. Logging every expense, \
            even small ones, shows where your money actually goes.",
            "Grouping expenses into categories such as food, rent and \
            entertainment makes patterns easy to spot.",
        ],
        tips: &[
            "Add transactions as they happen, or link your bank to import them.",
            "Review the category chart on your dashboard each week.",
        ],
    },
    Lesson {
        id: "emergency-fund",
        title: "Building an emergency fund",
        paragraphs: &[
            "An emergency fund is money set aside for surprises like a car repair \
            or a lost job. Aim for three to six months of essential expenses.",
            "Start small. Even a few dollars a week adds up and keeps an \
            unexpected bill from turning into debt.",
        ],
        tips: &[
            "Create a savings goal for your emergency fund.",
            "Add to it every time you get paid, before spending on wants.",
        ],
    },
    Lesson {
        id: "debt",
        title: "Managing debt",
        paragraphs: &[
            "Not all debt is equal. High-interest debt such as credit cards grows \
            quickly and should usually be paid off first.",
            "Always make the minimum payment on every debt, then put any extra \
            money towards the one with the highest interest rate.",
        ],
        tips: &[
            "List every debt with its balance and interest rate.",
            "Avoid taking on new debt while paying off old debt.",
        ],
    },
    Lesson {
        id: "saving",
        title: "Saving and investing",
        paragraphs: &[
            "Saving keeps money safe for short-term goals. Investing puts money to \
            work for long-term goals, at the cost of some risk.",
            "The earlier you start, the more time compound growth has to work for \
            you.",
        ],
        tips: &[
            "Pay yourself first by saving a fixed share of every pay.",
            "Ask the assistant how your current spending affects your goal.",
        ],
    },
];

fn lesson_view(lesson: &Lesson) -> Markup {
    html! {
        section id=(lesson.id) class={ (CARD_STYLE) " space-y-3" }
        {
            h2 class="text-lg font-semibold" { (lesson.title) }

            @for paragraph in lesson.paragraphs {
                p class="text-gray-700 dark:text-gray-300" { (paragraph) }
            }

            ul class="list-disc list-inside text-sm text-gray-600 dark:text-gray-400 space-y-1"
            {
                @for tip in lesson.tips {
                    li { (tip) }
                }
            }
        }
    }
}

fn learn_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::LEARN_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Learn" }

                nav aria-label="Lessons" class="flex flex-wrap gap-x-4 gap-y-1 text-sm"
                {
                    @for lesson in LESSONS {
                        a href={ "#" (lesson.id) } class=(LINK_STYLE) { (lesson.title) }
                    }
                }

                @for lesson in LESSONS {
                    (lesson_view(lesson))
                }
            }
        }
    };

    base("Learn", &[], &content)
}

/// Renders the financial literacy page.
pub async fn get_learn_page() -> Response {
    learn_view().into_response()
}
