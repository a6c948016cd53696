//! Command-line interface for the print-order quoting core: analyze a PDF,
//! apply order options, print the itemized quote.

use std::path::PathBuf;
use std::process;

use clap::{Arg, ArgAction, Command};
use printquote::{
    AnalysisError, AnalysisMode, AnalyzerConfig, Binding, Cover, DocumentAnalyzer, Error,
    OrderConfig, PricingEngine,
};
use tracing::{info, warn, Level};

fn cli() -> Command {
    Command::new("printquote")
        .about("Quote a print order from a PDF upload")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("PDF file to analyze")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("copies")
                .long("copies")
                .short('c')
                .value_parser(clap::value_parser!(u32))
                .default_value("1")
                .help("Number of copies"),
        )
        .arg(
            Arg::new("binding")
                .long("binding")
                .value_parser([
                    "none",
                    "staple",
                    "saddle-stitch",
                    "coil",
                    "comb",
                    "three-ring",
                ])
                .default_value("none")
                .help("Binding option"),
        )
        .arg(
            Arg::new("cover")
                .long("cover")
                .value_parser(["none", "clear-front", "cardstock", "laminated"])
                .default_value("none")
                .help("Cover option"),
        )
        .arg(
            Arg::new("tabs")
                .long("tabs")
                .action(ArgAction::SetTrue)
                .help("Add a tab set to each copy"),
        )
        .arg(
            Arg::new("duplex")
                .long("duplex")
                .action(ArgAction::SetTrue)
                .help("Double-sided printing (does not affect price)"),
        )
        .arg(
            Arg::new("booklet")
                .long("booklet")
                .action(ArgAction::SetTrue)
                .help("Booklet imposition (requires saddle-stitch binding)"),
        )
        .arg(
            Arg::new("quick")
                .long("quick")
                .action(ArgAction::SetTrue)
                .help("Quick structural analysis (no rasterization path)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Output format"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("warn")
                .help("Log verbosity"),
        )
}

fn parse_binding(value: &str) -> Binding {
    match value {
        "staple" => Binding::Staple,
        "saddle-stitch" => Binding::SaddleStitch,
        "coil" => Binding::Coil,
        "comb" => Binding::Comb,
        "three-ring" => Binding::ThreeRingBinder,
        _ => Binding::None,
    }
}

fn parse_cover(value: &str) -> Cover {
    match value {
        "clear-front" => Cover::ClearFront,
        "cardstock" => Cover::Cardstock,
        "laminated" => Cover::Laminated,
        _ => Cover::None,
    }
}

fn parse_level(value: &str) -> Level {
    match value {
        "error" => Level::ERROR,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::WARN,
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let level = parse_level(matches.get_one::<String>("log-level").unwrap());
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(err) = run(&matches).await {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

async fn run(matches: &clap::ArgMatches) -> printquote::Result<()> {
    let path = matches.get_one::<PathBuf>("file").unwrap();
    let order = OrderConfig {
        copies: *matches.get_one::<u32>("copies").unwrap(),
        binding: parse_binding(matches.get_one::<String>("binding").unwrap()),
        cover: parse_cover(matches.get_one::<String>("cover").unwrap()),
        has_tabs: matches.get_flag("tabs"),
        duplex: matches.get_flag("duplex"),
        booklet: matches.get_flag("booklet"),
    };
    order.validate()?;

    let mode = if matches.get_flag("quick") {
        AnalysisMode::Quick
    } else {
        AnalysisMode::Full
    };

    let data = std::fs::read(path)?;
    let analyzer = DocumentAnalyzer::new(AnalyzerConfig::default());
    let analysis = match analyzer.analyze(&data, mode).await {
        Ok(result) => result,
        Err(Error::Analysis(AnalysisError::UnparsableDocument(reason))) => {
            // An unanalyzable file must not block the order: quote from
            // the zero-knowledge default instead
            warn!(%reason, "document could not be analyzed, using defaults");
            printquote::AnalysisResult::unknown(0)
        }
        Err(err) => return Err(err),
    };

    let engine = PricingEngine::with_defaults();
    let quote = engine.quote(&analysis, &order);
    info!(total = quote.total_price, "quote computed");

    match matches.get_one::<String>("format").unwrap().as_str() {
        "json" => {
            let report = serde_json::json!({
                "analysis": analysis,
                "order": order,
                "quote": quote,
            });
            println!("{}", serde_json::to_string_pretty(&report).expect("serializable report"));
        }
        _ => print_text(&analysis, &quote),
    }
    Ok(())
}

fn print_text(analysis: &printquote::AnalysisResult, quote: &printquote::PricingBreakdown) {
    println!("Pages: {} total ({} B&W, {} color)", analysis.total_pages, analysis.bw_pages, analysis.color_pages);
    println!("       {} standard, {} fold-out", analysis.standard_pages, analysis.foldout_pages);
    if analysis.has_oversized_pages {
        let numbers: Vec<String> = analysis
            .oversized_page_numbers
            .iter()
            .map(|n| n.to_string())
            .collect();
        println!("       oversized pages: {}", numbers.join(", "));
    }
    println!("Tier:  {} (${:.2} B&W / ${:.2} color per page)", quote.tier_applied, quote.bw_rate, quote.color_rate);
    println!("  B&W pages        ${:>10.2}", quote.bw_pages_cost);
    println!("  Color pages      ${:>10.2}", quote.color_pages_cost);
    if quote.large_format_cost > 0.0 {
        println!("  Large format     ${:>10.2}", quote.large_format_cost);
    }
    println!("  Binding          ${:>10.2}", quote.binding_cost);
    println!("  Cover            ${:>10.2}", quote.cover_cost);
    println!("  Tabs             ${:>10.2}", quote.tabs_cost);
    println!("  Total            ${:>10.2}", quote.total_price);
    println!(
        "Shipping weight: {:.1} lb ({:.0} g)",
        quote.shipping_weight_lbs, quote.total_weight_grams
    );
    if quote.requires_manual_quote {
        println!(
            "MANUAL QUOTE REQUIRED: {}",
            quote.quote_reason.as_deref().unwrap_or("see order details")
        );
    }
}
