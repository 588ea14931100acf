//! Chart generation and rendering for the reports page.
//!
//! This module creates interactive ECharts visualizations of a year report:
//! - **Income and Expenses**: side-by-side monthly bars
//! - **Net Income**: monthly income minus expenses as a line
//! - **Expenses by Category**: a pie of the year's expenses
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title, VisualMap, VisualMapPiece},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Line, Pie, bar},
};
use maud::{Markup, PreEscaped, html};

use crate::{html::HeadElement, reports::core::YearReport};

/// A report chart with its HTML container ID and ECharts configuration.
pub(super) struct ReportChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl ReportChart {
    fn new(id: &'static str, chart: Chart) -> Self {
        Self {
            id,
            options: chart.to_string(),
        }
    }
}

/// Build every chart shown for `report`.
pub(super) fn report_charts(report: &YearReport) -> Vec<ReportChart> {
    vec![
        ReportChart::new("income-expenses-chart", income_expenses_chart(report)),
        ReportChart::new("net-income-chart", net_income_chart(report)),
        ReportChart::new("category-chart", category_chart(report)),
    ]
}

/// Renders the HTML containers for report charts.
pub(super) fn charts_view(charts: &[ReportChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for report charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[ReportChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

fn month_labels(report: &YearReport) -> Vec<String> {
    report
        .months
        .iter()
        .map(|figures| figures.month.month().to_string()[..3].to_owned())
        .collect()
}

fn income_expenses_chart(report: &YearReport) -> Chart {
    let income = report.months.iter().map(|figures| figures.income).collect::<Vec<_>>();
    let expenses = report
        .months
        .iter()
        .map(|figures| figures.expenses)
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Income and Expenses")
                .subtext(report.year.to_string())
                .left(20)
                .top("1%"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().left(250).top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(month_labels(report)))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Income")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(income),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(expenses),
        )
}

fn net_income_chart(report: &YearReport) -> Chart {
    let values = report
        .months
        .iter()
        .map(|figures| figures.net())
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Net Income")
                .subtext(report.year.to_string()),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(month_labels(report)))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .visual_map(VisualMap::new().show(false).pieces(vec![
            VisualMapPiece::new().lte(-1).color("red"),
            VisualMapPiece::new().gte(0).color("green"),
        ]))
        .series(Line::new().name("Net Income").data(values))
}

fn category_chart(report: &YearReport) -> Chart {
    let data = report
        .expenses_by_category
        .iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(category, total)| (*total, category.label()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext(report.year.to_string()),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{
        html::HeadElement,
        month::first_of_next_month,
        reports::core::{MonthlyFigures, YearReport},
        transaction::Category,
    };

    use super::{charts_script, report_charts};

    fn report() -> YearReport {
        let mut months = Vec::new();
        let mut month: Date = date!(2024 - 01 - 01);
        for _ in 0..12 {
            months.push(MonthlyFigures {
                month,
                income: 120.0,
                expenses: 80.0,
                cash: 0.0,
            });
            month = first_of_next_month(month);
        }

        YearReport {
            year: 2024,
            months,
            expenses_by_category: vec![
                (Category::Food, 600.0),
                (Category::Rent, 360.0),
                (Category::Entertainment, 0.0),
                (Category::Other, 0.0),
            ],
        }
    }

    #[test]
    fn builds_three_charts_with_month_labels() {
        let charts = report_charts(&report());

        let ids: Vec<_> = charts.iter().map(|chart| chart.id).collect();
        assert_eq!(
            ids,
            ["income-expenses-chart", "net-income-chart", "category-chart"]
        );
        assert!(charts[0].options.contains("\"Jan\""));
        assert!(charts[0].options.contains("\"Dec\""));
        assert!(charts[0].options.contains("Expenses"));
    }

    #[test]
    fn category_chart_skips_empty_categories() {
        let charts = report_charts(&report());
        let options = &charts[2].options;

        assert!(options.contains("Food"));
        assert!(options.contains("Rent"));
        assert!(!options.contains("Entertainment"));
    }

    #[test]
    fn script_initialises_every_chart() {
        let charts = report_charts(&report());

        let HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("want a script source head element");
        };

        for chart in &charts {
            assert!(script.0.contains(chart.id));
        }
    }
}
