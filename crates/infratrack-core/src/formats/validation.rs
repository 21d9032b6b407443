use crate::error::{InfraTrackError, Result};
use crate::formats::FormatValidation;
use std::io::Cursor;
use std::path::Path;

/// Upper bound for a single import; site files are small, anything larger is
/// almost certainly the wrong file.
pub const MAX_IMPORT_SIZE_MB: u64 = 256;

pub struct FormatValidator;

impl FormatValidator {
    /// Validate that a file exists and is readable
    pub fn validate_file_exists(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        if !path.exists() {
            validation.errors.push(format!("File not found: {}", path.display()));
            return validation;
        }
        if let Err(e) = std::fs::metadata(path) {
            validation.errors.push(format!("Cannot access file: {}", e));
        }

        validation
    }

    /// Validate file size is within reasonable limits
    pub fn validate_file_size(path: &Path, max_size_mb: Option<u64>) -> FormatValidation {
        let mut validation = FormatValidation::default();

        match std::fs::metadata(path) {
            Ok(metadata) => {
                let size_mb = metadata.len() / (1024 * 1024);

                if metadata.len() == 0 {
                    validation.errors.push("File is empty".to_string());
                } else if let Some(max_size) = max_size_mb {
                    if size_mb > max_size {
                        validation.errors.push(format!(
                            "File size ({} MB) exceeds maximum allowed size ({} MB)",
                            size_mb, max_size
                        ));
                    } else if size_mb > max_size / 2 {
                        validation.warnings.push(format!(
                            "Large file ({} MB) may take longer to process",
                            size_mb
                        ));
                    }
                }
            }
            Err(e) => {
                validation.errors.push(format!("Cannot read file metadata: {}", e));
            }
        }

        validation
    }

    /// Validate XML structure by attempting to parse
    pub fn validate_xml_structure(content: &[u8]) -> FormatValidation {
        let mut validation = FormatValidation::default();

        let mut reader = quick_xml::Reader::from_reader(content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => {
                    validation.errors.push(format!("Invalid XML structure: {}", e));
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        validation
    }

    /// Validate JSON structure by attempting to parse
    pub fn validate_json_structure(content: &[u8]) -> FormatValidation {
        let mut validation = FormatValidation::default();

        if let Err(e) = serde_json::from_slice::<serde_json::Value>(content) {
            validation.errors.push(format!("Invalid JSON structure: {}", e));
        }

        validation
    }

    /// Validate that an archive holds a member for every required extension
    pub fn validate_archive_members(
        content: &[u8],
        required_extensions: &[&str],
        optional_extensions: &[&str],
    ) -> FormatValidation {
        let mut validation = FormatValidation::default();

        let archive = match zip::ZipArchive::new(Cursor::new(content)) {
            Ok(a) => a,
            Err(e) => {
                validation.errors.push(format!("Not a readable zip archive: {}", e));
                return validation;
            }
        };

        let has_member = |ext: &str| {
            archive
                .file_names()
                .any(|name| name.to_lowercase().ends_with(&format!(".{}", ext)))
        };

        for ext in required_extensions {
            if !has_member(ext) {
                validation.errors.push(format!("Archive has no .{} member", ext));
            }
        }

        for ext in optional_extensions {
            if !has_member(ext) {
                validation.warnings.push(format!(
                    "Archive has no .{} member (may affect functionality)",
                    ext
                ));
            }
        }

        validation
    }

    /// Merge multiple validation results
    pub fn merge_validations(validations: Vec<FormatValidation>) -> FormatValidation {
        let mut merged = FormatValidation::default();

        for validation in validations {
            merged.errors.extend(validation.errors);
            merged.warnings.extend(validation.warnings);
        }

        merged
    }

    /// Convert a validation result to a Result type
    pub fn validation_to_result(validation: &FormatValidation, format_name: &str) -> Result<()> {
        if !validation.is_valid() {
            Err(InfraTrackError::format(format_name, validation.errors.join("; ")))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_validate_file_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let existing_file = create_test_file(&temp_dir, "pipes.csv", "Name\nP1");
        let nonexistent_file = temp_dir.path().join("nonexistent.csv");

        assert!(FormatValidator::validate_file_exists(&existing_file).is_valid());

        let validation = FormatValidator::validate_file_exists(&nonexistent_file);
        assert!(!validation.is_valid());
        assert!(!validation.errors.is_empty());
    }

    #[test]
    fn test_validate_file_size() {
        let temp_dir = tempfile::tempdir().unwrap();
        let small_file = create_test_file(&temp_dir, "small.dxf", "0\nEOF\n");
        let empty_file = create_test_file(&temp_dir, "empty.dxf", "");

        let validation = FormatValidator::validate_file_size(&small_file, Some(10));
        assert!(validation.is_valid());
        assert!(!validation.has_warnings());

        assert!(!FormatValidator::validate_file_size(&empty_file, Some(10)).is_valid());
    }

    #[test]
    fn test_validate_json_structure() {
        assert!(FormatValidator::validate_json_structure(br#"{"type": "FeatureCollection"}"#).is_valid());
        assert!(!FormatValidator::validate_json_structure(b"not json").is_valid());
    }

    #[test]
    fn test_validate_xml_structure() {
        assert!(FormatValidator::validate_xml_structure(b"<LandXML><Pipes/></LandXML>").is_valid());
        assert!(!FormatValidator::validate_xml_structure(b"<LandXML><Pipes></LandXML>").is_valid());
    }

    #[test]
    fn test_validate_archive_members() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("network/pipes.shp", options).unwrap();
        zip.write_all(b"shp").unwrap();
        zip.start_file("network/pipes.dbf", options).unwrap();
        zip.write_all(b"dbf").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let validation = FormatValidator::validate_archive_members(&bytes, &["shp", "shx"], &["prj"]);
        assert!(validation.errors.iter().any(|e| e.contains(".shx")));
        assert!(validation.warnings.iter().any(|w| w.contains(".prj")));

        let validation = FormatValidator::validate_archive_members(b"garbage", &["shp"], &[]);
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_validation_to_result() {
        let mut validation = FormatValidation::default();
        validation.errors.push("Test error".to_string());
        assert!(FormatValidator::validation_to_result(&validation, "DXF").is_err());

        let validation = FormatValidation::default();
        assert!(FormatValidator::validation_to_result(&validation, "DXF").is_ok());
    }
}
