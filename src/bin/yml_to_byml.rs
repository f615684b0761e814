//! Converts YAML text to a BYML document (§4.9, §6).

use std::io::{Read, Write};
use std::path::Path;

use clap::Parser;

/// Convert YAML text to a BYML document.
#[derive(Parser)]
struct Args {
    /// Input path, or `-` for stdin
    #[arg(default_value = "-")]
    input: String,
    /// Output path, or `-` for stdout; `!!` is replaced by the input
    /// basename. Compressed with Yaz0 when the extension begins with `.s`.
    #[arg(default_value = "-")]
    output: String,
    /// BYML format version to write
    #[arg(short = 'V', long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..=3))]
    version: u16,
    /// Write big-endian instead of little-endian
    #[arg(short = 'b', long)]
    big_endian: bool,
}

fn read_input(path: &str) -> std::io::Result<std::string::String> {
    if path == "-" {
        let mut buf = std::string::String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn resolve_output_path(output: &str, input: &str) -> String {
    if !output.contains("!!") {
        return output.to_string();
    }
    let basename = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stdin");
    output.replace("!!", basename)
}

fn wants_compression(output: &str) -> bool {
    Path::new(output)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.starts_with('s'))
}

fn run(args: Args) -> byml::Result<()> {
    let text = read_input(&args.input)?;
    let doc = byml::Byml::from_text(text)?;
    let endian = if args.big_endian {
        byml::Endian::Big
    } else {
        byml::Endian::Little
    };
    let binary = doc.to_binary_with_version(endian, args.version);

    let output = resolve_output_path(&args.output, &args.input);
    let framed = if output != "-" && wants_compression(&output) {
        tracing::debug!(path = %output, "Yaz0-compressing output");
        byml::yaz0::compress(&binary)
    } else {
        binary
    };

    if output == "-" {
        std::io::stdout().write_all(&framed)?;
    } else {
        std::fs::write(&output, &framed)?;
        tracing::info!(path = %output, version = args.version, "wrote BYML");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_trigger() {
        assert!(wants_compression("ActorInfo.sbyml"));
        assert!(wants_compression("ActorInfo.szs"));
        assert!(!wants_compression("ActorInfo.byml"));
    }

    #[test]
    fn basename_substitution() {
        assert_eq!(resolve_output_path("!!.byml", "path/to/ActorInfo.yml"), "ActorInfo.byml");
    }
}
