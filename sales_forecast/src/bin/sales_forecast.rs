//! Usage: `sales_forecast [data.csv] [config.json] [forecast_out.csv]`
//!
//! Without arguments the pipeline runs on a synthetic four-year series.

use sales_forecast::logging::init_tracing;
use sales_forecast::synthetic::SyntheticSales;
use sales_forecast::{MonthPeriod, PipelineConfig, SalesPipeline};
use std::env;
use std::fs::File;
use std::io::BufWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.get(1) {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let pipeline = SalesPipeline::new(config)?;

    let report = match args.first() {
        Some(path) => {
            println!("Forecasting sales from {}", path);
            pipeline.run_csv(path)?
        }
        None => {
            println!("No data file given, using a synthetic demo series");
            let data = SyntheticSales::new(MonthPeriod::new(2020, 1)?, 48)
                .noise(400.0)
                .dataframe()?;
            pipeline.run(&data)?
        }
    };

    let summary = report.summary();
    println!("\nModel: {}", report.model_name);
    println!("==========================================");
    println!("Average monthly sales: {:.2}", summary.average_monthly_sales);
    match summary.in_sample_accuracy {
        Some(accuracy) => println!("In-sample accuracy:    {:.1}%", accuracy),
        None => println!("In-sample accuracy:    n/a"),
    }
    println!(
        "Projected total:       {:.2} over {} months",
        summary.projected_total,
        report.forecast.points.len()
    );

    let decomposition = &report.decomposition;
    println!("\nTrend slope:           {:.2} per month", decomposition.trend_slope()?);
    println!("Seasonal amplitude:    {:.2}", decomposition.seasonal_amplitude());
    println!("Seasonal strength:     {:.2}", decomposition.seasonal_strength()?);

    let evaluation = &report.evaluation;
    println!(
        "\nHoldout {} to {}: {}",
        evaluation.test_range.0, evaluation.test_range.1, evaluation.metrics
    );

    println!("\n{:<10} {:>12} {:>12} {:>12}", "Month", "Forecast", "Lower", "Upper");
    for point in &report.forecast.points {
        println!(
            "{:<10} {:>12.2} {:>12.2} {:>12.2}",
            point.period.to_string(),
            point.point_estimate,
            point.lower_bound,
            point.upper_bound
        );
    }

    if let Some(path) = args.get(2) {
        let file = File::create(path)?;
        report.write_forecast_csv(BufWriter::new(file))?;
        println!("\nForecast written to {}", path);
    }

    Ok(())
}
