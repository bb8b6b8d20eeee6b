use advantagex::errors::ExchangeError;
use advantagex::reports::{daily_report_today, DailyReport};
use advantagex::simulationrun::{Exchange, SimulationRun};
use advantagex::config::ExchangeConfig;
use advantagex::logger::Logger;
use advantagex::utils::get_seed;
use rand::{rngs::StdRng, SeedableRng};
use plotters::prelude::*;
use std::fs;

const CHART_AUCTIONS: usize = 1000;
const DAILY_REPORT_CHART: &str = "charts/daily_report.png";

/// Run a day's worth of auctions and chart its daily report
pub fn generate_all_charts(config: &ExchangeConfig) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all("charts")?;

    let exchange = Exchange::from_config(config)?;
    let mut rng = StdRng::seed_from_u64(get_seed(7331));
    let mut logger = Logger::new();
    let run = SimulationRun::new(&exchange, CHART_AUCTIONS, &mut rng, &mut logger)?;
    let report = daily_report_today(&run.winning_bids, &exchange.exchange_name);

    create_daily_report_chart(&report, DAILY_REPORT_CHART)
}

/// Bar chart with Total Impressions, Total Spend and Average CPM side by side
pub fn create_daily_report_chart(report: &DailyReport, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let average_cpm = match report.average_cpm {
        Some(cpm) if report.total_impressions > 0 => cpm,
        _ => return Err(Box::new(ExchangeError::NotEnoughData(
            format!("daily report of {} has no impressions to chart", report.exchange_name)))),
    };

    let bars = [
        ("Total Impressions", report.total_impressions as f64, BLUE),
        ("Total Spend", report.total_spend, GREEN),
        ("Average CPM", average_cpm, RED),
    ];
    let max_value = bars.iter().map(|(_, value, _)| *value).fold(0.0, f64::max);

    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} daily report ({})", report.exchange_name, report.date.format("%Y-%m-%d")), ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..bars.len()).into_segmented(), 0.0..max_value * 1.1)?;

    chart.configure_mesh()
        .disable_x_mesh()
        .x_desc("Metric")
        .y_desc("Value")
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(index) => bars.get(*index).map(|(label, _, _)| label.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    for (index, (label, value, color)) in bars.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(SegmentValue::Exact(index), 0.0), (SegmentValue::Exact(index + 1), *value)],
            color.mix(0.7).filled(),
        )))?
        .label(format!("{}: {:.2}", label, value))
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;

    println!("Daily report chart saved to {}", filename);
    println!("Impressions: {}, Spend: {:.2}, CPM: {:.2}", report.total_impressions, report.total_spend, average_cpm);

    Ok(())
}
