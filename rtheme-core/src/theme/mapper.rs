//! Mapping of repository files onto theme fields
//!
//! Every `(target, field)` pair of the fixed schema maps to one path:
//! stylesheets to `<target>/<target>.scss`, everything else to
//! `<target>/<field>.html`. Nothing outside the schema is read.

use super::{Field, FieldKey, FieldStore, Target, STYLESHEET_EXTENSION};
use crate::git::Fetcher;
use crate::Result;

/// Read access to the files of a fetched repository
pub trait FileSource {
    /// Content of `relative_path`, or `None` if absent
    fn read_file(&self, relative_path: &str) -> Result<Option<Vec<u8>>>;
}

impl FileSource for Fetcher {
    fn read_file(&self, relative_path: &str) -> Result<Option<Vec<u8>>> {
        self.read(relative_path)
    }
}

/// Repository path a field is read from
pub fn field_path(target: Target, field: Field) -> String {
    if field.is_stylesheet() {
        format!("{0}/{0}.{1}", target.as_str(), STYLESHEET_EXTENSION)
    } else {
        format!("{}/{}.html", target.as_str(), field.as_str())
    }
}

/// Applies repository contents to a field store
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldMapper;

impl FieldMapper {
    /// Set every schema field from `source`, clearing fields whose file is absent
    ///
    /// Returns the keys whose stored value changed.
    pub fn apply<S, F>(source: &S, fields: &mut F) -> Result<Vec<FieldKey>>
    where
        S: FileSource + ?Sized,
        F: FieldStore + ?Sized,
    {
        let mut changed = Vec::new();

        for target in Target::ALL {
            for field in Field::ALL {
                let path = field_path(target, field);
                let content = match source.read_file(&path)? {
                    Some(bytes) => match String::from_utf8(bytes) {
                        Ok(text) => Some(text),
                        Err(_) => {
                            tracing::warn!(path = %path, "Ignoring field file that is not UTF-8");
                            None
                        }
                    },
                    None => None,
                };

                if fields.set_field(target, field, content) {
                    changed.push((target, field));
                }
            }
        }

        Ok(changed)
    }
}
