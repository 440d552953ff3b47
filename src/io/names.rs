//! CEOS file pairing.
//!
//! Matches a data file with its companion leader (and sometimes trailer)
//! metadata file across the naming conventions the various processing
//! facilities use. Rules are tried strictly in table order; the first rule
//! for which every required file opens wins.

use crate::types::{CeosError, CeosResult};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Upper bound on discovered bands per product.
pub const MAX_BANDS: usize = 10;

/// ALOS data channel prefixes, probed in this exact order.
const ALOS_CHANNELS: [&str; 13] = [
    "HH-", "HV-", "VH-", "VV-", "01-", "02-", "03-", "04-", "05-", "06-", "07-", "08-", "09-",
];

/// How a rule's extension attaches to the base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorKind {
    /// `base.ext`
    Suffix,
    /// `PREFIX.base`
    DotPrefix,
    /// `PREFIX-base` (ALOS)
    DashPrefix,
    /// `PREFIX_base` (CDPF/RSI leader-trailer sets)
    UnderscorePrefix,
}

/// One naming convention: coupled metadata/data extensions plus an optional
/// trailer extension for formats that split metadata across two files.
#[derive(Debug, Clone, Copy)]
pub struct NamingRule {
    pub metadata: &'static str,
    pub trailer: Option<&'static str>,
    pub data: &'static str,
    pub kind: SeparatorKind,
}

impl NamingRule {
    /// Extension list entry as shown in diagnostics, e.g. "LEA_ TRA_".
    fn metadata_label(&self) -> String {
        match self.trailer {
            Some(t) => format!("{} {}", self.metadata, t),
            None => self.metadata.to_string(),
        }
    }
}

/// The fixed rule table. Order is significant and load-bearing: earlier
/// rules shadow later ones when several conventions are satisfiable.
pub const NAMING_RULES: [NamingRule; 8] = [
    NamingRule {
        metadata: "LEA_",
        trailer: Some("TRA_"),
        data: "DAT_",
        kind: SeparatorKind::UnderscorePrefix,
    },
    NamingRule {
        metadata: ".sarl",
        trailer: Some(".sart"),
        data: ".sard",
        kind: SeparatorKind::Suffix,
    },
    NamingRule {
        metadata: ".L",
        trailer: None,
        data: ".D",
        kind: SeparatorKind::Suffix,
    },
    NamingRule {
        metadata: ".LDR",
        trailer: None,
        data: ".RAW",
        kind: SeparatorKind::Suffix,
    },
    NamingRule {
        metadata: ".ldr",
        trailer: None,
        data: ".raw",
        kind: SeparatorKind::Suffix,
    },
    NamingRule {
        metadata: "LEA.",
        trailer: None,
        data: "DAT.",
        kind: SeparatorKind::DotPrefix,
    },
    NamingRule {
        metadata: "lea.",
        trailer: None,
        data: "dat.",
        kind: SeparatorKind::DotPrefix,
    },
    NamingRule {
        metadata: "LED-",
        trailer: None,
        data: "IMG-",
        kind: SeparatorKind::DashPrefix,
    },
];

/// A successful metadata-side match.
#[derive(Debug, Clone)]
pub struct MetadataMatch {
    pub leader: PathBuf,
    pub trailer: Option<PathBuf>,
    pub rule_index: usize,
}

/// A successful data-side match. `bands` preserves probe order.
#[derive(Debug, Clone)]
pub struct DataMatch {
    pub bands: Vec<PathBuf>,
    pub rule_index: usize,
}

/// A complete, coupled data/metadata file set.
#[derive(Debug, Clone)]
pub struct CeosFileSet {
    pub data: Vec<PathBuf>,
    pub leader: PathBuf,
    pub trailer: Option<PathBuf>,
    pub band_count: usize,
    pub rule_index: usize,
}

fn split_dir_and_file(name: &Path) -> (PathBuf, String) {
    let dir = name.parent().map(Path::to_path_buf).unwrap_or_default();
    let file = name
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, file)
}

/// Strip an already-attached extension of the given separator kind, so a
/// caller may pass either a bare base name or a full file name.
fn strip_existing(file: &str, kind: SeparatorKind) -> Option<String> {
    match kind {
        SeparatorKind::Suffix => file.rfind('.').map(|i| file[..i].to_string()),
        SeparatorKind::DotPrefix => file.find('.').map(|i| file[i + 1..].to_string()),
        SeparatorKind::DashPrefix => file.find('-').map(|i| file[i + 1..].to_string()),
        SeparatorKind::UnderscorePrefix => file.find('_').map(|i| file[i + 1..].to_string()),
    }
}

fn compose(dir: &Path, ext: &str, file: &str, kind: SeparatorKind) -> PathBuf {
    let name = match kind {
        SeparatorKind::Suffix => format!("{}{}", file, ext),
        _ => format!("{}{}", ext, file),
    };
    dir.join(name)
}

fn openable(path: &Path) -> bool {
    File::open(path).is_ok()
}

/// Find the metadata file(s) paired to `base` by walking the rule table.
pub fn find_metadata(base: &Path) -> Option<MetadataMatch> {
    let (dir, file) = split_dir_and_file(base);

    for (index, rule) in NAMING_RULES.iter().enumerate() {
        // Try the name as given, then once more with any attached
        // extension stripped off.
        let mut candidates = vec![file.clone()];
        if let Some(stripped) = strip_existing(&file, rule.kind) {
            if stripped != file {
                candidates.push(stripped);
            }
        }

        for name in &candidates {
            let leader = compose(&dir, rule.metadata, name, rule.kind);
            if !openable(&leader) {
                continue;
            }
            match rule.trailer {
                Some(trailer_ext) => {
                    let trailer = compose(&dir, trailer_ext, name, rule.kind);
                    if openable(&trailer) {
                        log::debug!("metadata match via rule {}: {}", index, leader.display());
                        return Some(MetadataMatch {
                            leader,
                            trailer: Some(trailer),
                            rule_index: index,
                        });
                    }
                }
                None => {
                    log::debug!("metadata match via rule {}: {}", index, leader.display());
                    return Some(MetadataMatch {
                        leader,
                        trailer: None,
                        rule_index: index,
                    });
                }
            }
        }
    }
    None
}

/// Find the data file(s) paired to `base` by walking the rule table.
///
/// The dash-prefix (ALOS) rule probes the fixed polarization/numeric
/// channel set and accumulates every hit as a band; other rules match a
/// single file.
pub fn find_data(base: &Path) -> Option<DataMatch> {
    let (dir, file) = split_dir_and_file(base);

    for (index, rule) in NAMING_RULES.iter().enumerate() {
        if rule.kind == SeparatorKind::DashPrefix {
            let mut bands = Vec::new();
            for channel in ALOS_CHANNELS {
                if bands.len() >= MAX_BANDS {
                    break;
                }
                let name = format!("{}{}{}", rule.data, channel, file);
                let candidate = dir.join(name);
                if openable(&candidate) {
                    bands.push(candidate);
                }
            }
            if bands.is_empty() {
                // No channel variant on disk; accept a bare-prefix file.
                let candidate = compose(&dir, rule.data, &file, rule.kind);
                if openable(&candidate) {
                    bands.push(candidate);
                }
            }
            if !bands.is_empty() {
                log::debug!("data match via rule {}: {} band(s)", index, bands.len());
                return Some(DataMatch {
                    bands,
                    rule_index: index,
                });
            }
            continue;
        }

        let mut candidates = vec![file.clone()];
        if let Some(stripped) = strip_existing(&file, rule.kind) {
            if stripped != file {
                candidates.push(stripped);
            }
        }
        for name in &candidates {
            let candidate = compose(&dir, rule.data, name, rule.kind);
            if openable(&candidate) {
                log::debug!("data match via rule {}: {}", index, candidate.display());
                return Some(DataMatch {
                    bands: vec![candidate],
                    rule_index: index,
                });
            }
        }
    }
    None
}

/// Find a complete data/metadata pairing. Both sides must match through
/// the same (coupled) rule entry.
pub fn find_pair(base: &Path) -> Option<CeosFileSet> {
    let metadata = find_metadata(base)?;
    let data = find_data(base)?;
    if metadata.rule_index != data.rule_index {
        return None;
    }
    let band_count = data.bands.len();
    Some(CeosFileSet {
        data: data.bands,
        leader: metadata.leader,
        trailer: metadata.trailer,
        band_count,
        rule_index: metadata.rule_index,
    })
}

fn readable_list<I: Iterator<Item = String>>(items: I) -> String {
    let items: Vec<String> = items.collect();
    match items.len() {
        0 => String::new(),
        1 => items[0].clone(),
        _ => {
            let head = items[..items.len() - 1].join(", ");
            format!("{}, and {}", head, items[items.len() - 1])
        }
    }
}

fn missing_metadata_error(base: &Path) -> CeosError {
    let list = readable_list(NAMING_RULES.iter().map(|r| r.metadata_label()));
    CeosError::RequiredResourceMissing(format!(
        "This program was looking for the CEOS style metadata file,\n\
         {}\n\
         That file either does not exist or cannot be read.\n\
         Expected metadata file extensions are:\n\
         {}",
        base.display(),
        list
    ))
}

fn missing_data_error(base: &Path) -> CeosError {
    let list = readable_list(NAMING_RULES.iter().map(|r| r.data.to_string()));
    CeosError::RequiredResourceMissing(format!(
        "This program was looking for the CEOS style data file,\n\
         {}\n\
         That file either does not exist or cannot be read.\n\
         Expected data file extensions are:\n\
         {}",
        base.display(),
        list
    ))
}

fn missing_pair_error(base: &Path) -> CeosError {
    let list = readable_list(
        NAMING_RULES
            .iter()
            .map(|r| format!("({} {})", r.data, r.metadata_label())),
    );
    CeosError::RequiredResourceMissing(format!(
        "This program was looking for the CEOS style SAR files,\n\
         {} and its associated file.\n\
         One or both files either do not exist or cannot be read.\n\
         Expected fileset extensions are:\n\
         {}",
        base.display(),
        list
    ))
}

/// Like [`find_metadata`], but a miss is a fatal, fully-diagnosed error.
pub fn require_metadata(base: &Path) -> CeosResult<MetadataMatch> {
    find_metadata(base).ok_or_else(|| missing_metadata_error(base))
}

/// Like [`find_data`], but a miss is a fatal, fully-diagnosed error.
pub fn require_data(base: &Path) -> CeosResult<DataMatch> {
    find_data(base).ok_or_else(|| missing_data_error(base))
}

/// Like [`find_pair`], but a miss is a fatal error listing every extension
/// pair in the table.
pub fn require_pair(base: &Path) -> CeosResult<CeosFileSet> {
    find_pair(base).ok_or_else(|| missing_pair_error(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").expect("create test file");
    }

    #[test]
    fn suffix_pair_d_l() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "scene.D");
        touch(tmp.path(), "scene.L");
        let set = find_pair(&tmp.path().join("scene")).expect("pair");
        assert_eq!(set.band_count, 1);
        assert_eq!(set.rule_index, 2);
        assert!(set.leader.ends_with("scene.L"));
        assert!(set.trailer.is_none());
    }

    #[test]
    fn already_attached_extension_is_stripped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "scene.D");
        touch(tmp.path(), "scene.L");
        // Caller passes the data file itself rather than the base name.
        let set = find_pair(&tmp.path().join("scene.D")).expect("pair");
        assert!(set.leader.ends_with("scene.L"));
    }

    #[test]
    fn trailer_rule_requires_both_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "scene.sard");
        touch(tmp.path(), "scene.sarl");
        assert!(find_metadata(&tmp.path().join("scene")).is_none());

        touch(tmp.path(), "scene.sart");
        let m = find_metadata(&tmp.path().join("scene")).expect("leader+trailer");
        assert!(m.trailer.is_some());
        assert_eq!(m.rule_index, 1);
    }

    #[test]
    fn rule_precedence_is_table_order() {
        let tmp = TempDir::new().unwrap();
        // Both the .L/.D and .ldr/.raw conventions are satisfiable; the
        // earlier table entry must win.
        touch(tmp.path(), "scene.D");
        touch(tmp.path(), "scene.L");
        touch(tmp.path(), "scene.raw");
        touch(tmp.path(), "scene.ldr");
        let set = find_pair(&tmp.path().join("scene")).expect("pair");
        assert_eq!(set.rule_index, 2);
        assert!(set.data[0].ends_with("scene.D"));
    }

    #[test]
    fn dot_prefix_pair() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "DAT.scene");
        touch(tmp.path(), "LEA.scene");
        let set = find_pair(&tmp.path().join("scene")).expect("pair");
        assert!(set.data[0].ends_with("DAT.scene"));
        assert!(set.leader.ends_with("LEA.scene"));
    }

    #[test]
    fn underscore_prefix_triple() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "DAT_scene");
        touch(tmp.path(), "LEA_scene");
        touch(tmp.path(), "TRA_scene");
        let set = find_pair(&tmp.path().join("scene")).expect("triple");
        assert_eq!(set.rule_index, 0);
        assert!(set.trailer.expect("trailer").ends_with("TRA_scene"));
    }

    #[test]
    fn alos_multiband_probe_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "LED-X");
        touch(tmp.path(), "IMG-HH-X");
        touch(tmp.path(), "IMG-HV-X");
        touch(tmp.path(), "IMG-VV-X");
        let set = find_pair(&tmp.path().join("X")).expect("pair");
        assert_eq!(set.band_count, 3);
        assert!(set.data[0].ends_with("IMG-HH-X"));
        assert!(set.data[1].ends_with("IMG-HV-X"));
        assert!(set.data[2].ends_with("IMG-VV-X"));
    }

    #[test]
    fn alos_numeric_channels() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "LED-X");
        touch(tmp.path(), "IMG-01-X");
        touch(tmp.path(), "IMG-03-X");
        let set = find_pair(&tmp.path().join("X")).expect("pair");
        assert_eq!(set.band_count, 2);
        assert!(set.data[0].ends_with("IMG-01-X"));
        assert!(set.data[1].ends_with("IMG-03-X"));
    }

    #[test]
    fn alos_bare_prefix_fallback() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "LED-X");
        touch(tmp.path(), "IMG-X");
        let set = find_pair(&tmp.path().join("X")).expect("pair");
        assert_eq!(set.band_count, 1);
        assert!(set.data[0].ends_with("IMG-X"));
    }

    #[test]
    fn mismatched_rules_are_not_a_pair() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "scene.D");
        touch(tmp.path(), "scene.ldr");
        assert!(find_pair(&tmp.path().join("scene")).is_none());
    }

    #[test]
    fn require_pair_lists_every_extension_pair() {
        let tmp = TempDir::new().unwrap();
        let err = require_pair(&tmp.path().join("nothing")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("(DAT_ LEA_ TRA_)"), "{}", msg);
        assert!(msg.contains("(.sard .sarl .sart)"), "{}", msg);
        assert!(msg.contains("(.D .L)"), "{}", msg);
        assert!(msg.contains("(.RAW .LDR)"), "{}", msg);
        assert!(msg.contains("(.raw .ldr)"), "{}", msg);
        assert!(msg.contains("(DAT. LEA.)"), "{}", msg);
        assert!(msg.contains("(dat. lea.)"), "{}", msg);
        assert!(msg.contains("and (IMG- LED-)"), "{}", msg);
    }

    #[test]
    fn plain_lookup_never_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(find_metadata(&tmp.path().join("nothing")).is_none());
        assert!(find_data(&tmp.path().join("nothing")).is_none());
    }
}
