//
// cargo run -- "Jane Doe" "Woodwork"                      (preview to label.png)
// cargo run -- --printer tspl "Owner" "2024-01-01|2024-03-01"
//
use badger_label::{
    DymoPrinter, Error, Label, LabelConfig, Model, PreviewPrinter, Printer, RotatedPrinter,
    TrueTypeFont, TsplPrinter,
};
use log::{info, warn};
use std::{env, process, str::FromStr};

const DEFAULT_FONT: &str = "Arial.ttf";

#[derive(Debug)]
struct Args {
    dpi: Option<u32>,
    width_mm: f64,
    height_mm: f64,
    printer: Option<Model>,
    out: String,
    rotate: bool,
    lines: Vec<Vec<String>>,
}

fn print_usage() {
    println!("Usage: badger-label [OPTIONS] LINE...");
    println!("Options:");
    println!("  --printer NAME   dymo or tspl (default: write a PNG preview)");
    println!("  --out FILE       preview file name (default: label.png)");
    println!("  --dpi N          preview resolution (default: 300)");
    println!("  --width-mm W     label width (default: 89)");
    println!("  --height-mm H    label height (default: 36)");
    println!("  --rotate         turn the label 90 degrees before printing");
    println!("\nSeparate side by side elements of a line with '|'.");
    println!("The font is read from $BADGER_FONT (default: {}).", DEFAULT_FONT);
}

fn value<T: FromStr>(iter: &mut std::slice::Iter<String>, flag: &str) -> Result<T, String> {
    let raw = iter
        .next()
        .ok_or_else(|| format!("{} needs a value", flag))?;
    raw.parse()
        .map_err(|_| format!("invalid value '{}' for {}", raw, flag))
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args {
        dpi: None,
        width_mm: 89.0,
        height_mm: 36.0,
        printer: None,
        out: "label.png".to_string(),
        rotate: false,
        lines: Vec::new(),
    };

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dpi" => args.dpi = Some(value(&mut iter, arg)?),
            "--width-mm" => args.width_mm = value(&mut iter, arg)?,
            "--height-mm" => args.height_mm = value(&mut iter, arg)?,
            "--out" => args.out = value(&mut iter, arg)?,
            "--rotate" => args.rotate = true,
            "--printer" => {
                let name: String = value(&mut iter, arg)?;
                args.printer = Some(
                    Model::from_name(&name).ok_or_else(|| format!("unknown printer '{}'", name))?,
                );
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{}'", flag)),
            line => args
                .lines
                .push(line.split('|').map(|e| e.trim().to_string()).collect()),
        }
    }

    if args.lines.is_empty() {
        return Err("no lines given".to_string());
    }
    Ok(args)
}

fn open_printer(args: &Args) -> Result<Box<dyn Printer>, Error> {
    let opened: Result<Box<dyn Printer>, Error> = match args.printer {
        None => Ok(Box::new(PreviewPrinter::new(&args.out))),
        Some(Model::LabelWriter450) => DymoPrinter::open().map(|p| Box::new(p) as Box<dyn Printer>),
        Some(model) => TsplPrinter::open(model).map(|p| Box::new(p) as Box<dyn Printer>),
    };

    let printer: Box<dyn Printer> = match opened {
        Err(err @ Error::DeviceNotFound { .. }) | Err(err @ Error::MissingEndpoint(_)) => {
            warn!("{}, writing a preview to {} instead", err, args.out);
            Box::new(PreviewPrinter::new(&args.out))
        }
        other => other?,
    };

    if args.rotate {
        Ok(Box::new(RotatedPrinter::new(printer)))
    } else {
        Ok(printer)
    }
}

fn run(args: Args) -> Result<(), Error> {
    let font_path = env::var("BADGER_FONT").unwrap_or_else(|_| DEFAULT_FONT.to_string());
    let font = TrueTypeFont::open(&font_path)?;

    let mut printer = open_printer(&args)?;
    let size_mm = (args.width_mm, args.height_mm);
    let mut config = LabelConfig::for_printer(&printer, size_mm);
    if let (Some(dpi), None) = (args.dpi, args.printer) {
        config = LabelConfig::new(dpi, size_mm).padding(printer.padding_mm());
    }

    let label = Label::new(&args.lines, config, &font)?;
    let bitmap = label.render()?.clone();
    info!("rendered {}x{} label", bitmap.width(), bitmap.height());
    printer.print_label(bitmap, false)
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let raw: Vec<String> = env::args().skip(1).collect();
    if raw.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return;
    }

    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_usage();
            process::exit(2);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
