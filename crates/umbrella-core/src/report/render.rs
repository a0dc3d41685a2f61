use crate::report::model::{FileScan, ScanReport};
use crate::{ENGINE_VERSION, TOOL_NAME};

pub fn render_text(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, ENGINE_VERSION));

    match report {
        ScanReport::File(file) => render_file(&mut out, file),
        ScanReport::Directory(dir) => {
            out.push_str(&format!("Directory: {}\n", dir.root));
            for file in dir.flagged() {
                render_file(&mut out, file);
            }
            if dir.skipped > 0 {
                out.push_str(&format!("Skipped (unreadable): {}\n", dir.skipped));
            }
        }
    }

    let summary = report.summary();
    out.push_str(&format!(
        "Threats: {}  Files: {}  Time: {} ms\n",
        summary.threats_found, summary.files_scanned, summary.scan_time_ms
    ));
    out
}

fn render_file(out: &mut String, file: &FileScan) {
    out.push_str(&format!("{} [{}]", file.path, file.verdict));
    if file.truncated {
        out.push_str(" (truncated)");
    }
    out.push('\n');
    for t in &file.outcome.matched {
        out.push_str(&format!("  - {} [{:?}] {}", t.id, t.severity, t.title));
        if !t.lines.is_empty() {
            let lines: Vec<String> = t.lines.iter().map(|l| l.to_string()).collect();
            out.push_str(&format!(" (line {})", lines.join(", ")));
        }
        out.push('\n');
    }
}
