//! Commitgen Core - Shared configuration and typed errors
//!
//! This crate defines the filesystem layout configuration (`DataDirs`),
//! the train/validation split selector (`Split`), and the typed errors
//! shared by the rest of the workspace.

mod config;
mod error;
mod split;

pub use config::{DataDirs, MARKER_EXT};
pub use error::CoreError;
pub use split::Split;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dirs_layout() {
        let dirs = DataDirs::new("/project");
        assert_eq!(dirs.raw_repos(), std::path::Path::new("/project/data/raw-repos"));
        assert_eq!(
            dirs.processed_repo("sample"),
            std::path::Path::new("/project/data/processed-repos/sample")
        );
        assert_eq!(
            dirs.raw_marker("sample"),
            std::path::Path::new("/project/data/raw-repos/sample.commitgen")
        );
        assert_eq!(dirs.saved_models(), std::path::Path::new("/project/models/saved"));
    }

    #[test]
    fn test_split_parsing() {
        assert_eq!("train".parse::<Split>().unwrap(), Split::Train);
        assert_eq!("val".parse::<Split>().unwrap(), Split::Val);
        assert!(matches!(
            "test".parse::<Split>(),
            Err(CoreError::InvalidSplit(_))
        ));
    }

    #[test]
    fn test_split_partition() {
        let ids = ["a", "b", "c", "d"];
        assert_eq!(Split::Train.partition(&ids, 0.5), &["a", "b"]);
        assert_eq!(Split::Val.partition(&ids, 0.5), &["c", "d"]);
        // floor(0.6 * 4) = 2
        assert_eq!(Split::Train.partition(&ids, 0.6).len(), 2);
        assert_eq!(Split::Train.partition(&ids, 1.0).len(), 4);
        assert!(Split::Val.partition(&ids, 1.0).is_empty());
        assert!(Split::Train.partition(&ids, 0.0).is_empty());
    }
}
