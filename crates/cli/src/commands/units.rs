use pluto_core::units::{self, QuantityKind};

use crate::OutputFormat;

pub(crate) fn cmd_units(output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let groups: Vec<_> = QuantityKind::ALL
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "kind": kind.name(),
                        "units": units::by_kind(*kind).collect::<Vec<_>>(),
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&groups)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for kind in QuantityKind::ALL {
                let spellings: Vec<_> = units::by_kind(kind).collect();
                println!("{:<20} {}", kind.name(), spellings.join(" "));
            }
        }
    }
}
