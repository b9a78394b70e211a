use sales_forecast::evaluation::Evaluator;
use sales_forecast::events::EventCalendar;
use sales_forecast::models::ModelConfig;
use sales_forecast::period::MonthPeriod;
use sales_forecast::synthetic::SyntheticSales;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sales Forecast: Model Comparison Example");
    println!("========================================\n");

    // Five years of monthly sales
    let start = MonthPeriod::new(2019, 1)?;
    let series = SyntheticSales::new(start, 60)
        .base(25_000.0)
        .slope(120.0)
        .amplitude(4_000.0)
        .noise(900.0)
        .seed(11)
        .series()?;
    println!("Sample data created: {} months from {}\n", series.len(), start);

    let configs = [
        ModelConfig::default(),
        ModelConfig::SeasonalRegression { fourier_order: 4 },
        ModelConfig::SeasonalRegression { fourier_order: 2 },
        ModelConfig::SeasonalNaive,
    ];

    // Score every model on the same 12 month holdout
    let evaluator = Evaluator::new(12)?;
    let events = EventCalendar::new();
    for config in &configs {
        let model = config.build(0.8)?;
        let name = model.name().to_string();
        let evaluation = evaluator.evaluate(model, &series, &events)?;
        println!("{:<40} {}", name, evaluation.metrics);
    }

    Ok(())
}
