use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // For each hid.bin file in our tests/data directory, create one test function
    // that parses that report descriptor and checks the report sizes add up.
    println!("cargo:rerun-if-changed=tests/data");

    let datadir: PathBuf = [concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data")]
        .iter()
        .collect();
    let out_dir = std::env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let dest_path = PathBuf::from(&out_dir).join("test-report-descriptors.rs");
    let mut file = std::fs::File::create(dest_path)?;

    writeln!(file, "use hiddecode::*;")?;
    writeln!(file)?;

    let Ok(entries) = std::fs::read_dir(datadir) else {
        return Ok(());
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".hid.bin"))
        })
        .collect();
    paths.sort();

    for path in paths {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let funcname = filename.replace([':', '.', '-'], "_");
        writeln!(
            file,
            "
#[test]
#[allow(non_snake_case)]
fn test_{funcname}() {{
    let bytes: Vec<u8> = std::fs::read({path:?}).unwrap();
    let rdesc = ReportDescriptor::try_from(&bytes).expect(\"Failed to parse {filename}\");
    for direction in [Direction::Input, Direction::Output, Direction::Feature] {{
        for report in rdesc.reports(direction) {{
            let bits: usize = report.items.iter().map(|f| f.width().0).sum();
            assert_eq!(bits, report.size.0, \"{filename}: {{direction}} report {{:?}}\", report.id);
        }}
    }}
}}
"
        )?;
    }

    Ok(())
}
