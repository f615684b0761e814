//! Converts a BYML document to YAML text (§4.9, §6).

use std::io::{Read, Write};
use std::path::Path;

use clap::Parser;

/// Convert a BYML document to YAML text.
#[derive(Parser)]
struct Args {
    /// Input path, or `-` for stdin
    #[arg(default_value = "-")]
    input: String,
    /// Output path, or `-` for stdout; `!!` is replaced by the input basename
    #[arg(default_value = "-")]
    output: String,
}

fn read_input(path: &str) -> std::io::Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(path)
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

fn run(args: Args) -> byml::Result<()> {
    let raw = read_input(&args.input)?;
    let data = byml::yaz0::decompress_if(&raw)?;
    if data.len() != raw.len() {
        tracing::debug!(bytes = data.len(), "decompressed Yaz0 envelope");
    }
    let doc = byml::Byml::from_binary(&data)?;
    let text = doc.to_text()?;

    let output = resolve_output_path(&args.output, &args.input);
    if output == "-" {
        std::io::stdout().write_all(text.as_bytes())?;
    } else {
        std::fs::write(&output, text)?;
        tracing::info!(path = %output, "wrote YAML");
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
    fn basename_substitution() {
        assert_eq!(resolve_output_path("!!.yml", "path/to/ActorInfo.byml"), "ActorInfo.yml");
        assert_eq!(resolve_output_path("out.yml", "in.byml"), "out.yml");
    }

    #[test]
    fn stdin_basename_fallback() {
        assert_eq!(resolve_output_path("!!.yml", "-"), "stdin.yml");
    }
}
