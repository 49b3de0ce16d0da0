use std::env;
use std::process::ExitCode;

use eid_scanner::scanner::EmbeddedIdentifierScanner;
use eid_scanner::VecSink;

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: eid-scanner <path>");
        return ExitCode::FAILURE;
    };

    let scanner = EmbeddedIdentifierScanner::new();
    let mut sink = VecSink::new();

    match scanner.scan_file(&path, &mut sink) {
        Ok(result) => {
            println!("{path}: {result:?}");
            for evidence in sink.into_vec() {
                println!(
                    "  [{tag}] {field} = {value:?} ({confidence:?})",
                    tag = evidence.source_tag,
                    field = evidence.field_name,
                    value = evidence.value,
                    confidence = evidence.confidence,
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{path}: {err}");
            ExitCode::FAILURE
        }
    }
}
