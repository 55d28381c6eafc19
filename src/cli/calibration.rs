use anyhow::Result;

use tidyplate::calibration::CalibrationTable;

/// Print the fluorophore calibration table
pub fn run() -> Result<()> {
    let table = CalibrationTable;

    println!("Fluorophore Calibration");
    println!("=======================");
    println!("Raw units per uM in a 10 uL reaction");
    println!();
    println!("{:<12} {:<8} {:>6} {:>12}", "Fluorophore", "Reader", "Gain", "Factor");
    for entry in table.entries() {
        println!(
            "{:<12} {:<8} {:>6} {:>12}",
            entry.fluorophore,
            entry.reader.code(),
            entry.gain,
            entry.factor
        );
    }

    Ok(())
}
