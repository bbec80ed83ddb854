//! Humanify command implementation

use commitgen_data::acquire;

/// Prints the canonical short name of a repository URL
pub fn cmd_humanify(repo: &str) {
    println!("{}", acquire::humanify(repo));
}
