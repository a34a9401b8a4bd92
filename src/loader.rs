use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{BmpmError, BmpmResult};
use crate::normalize::ApostropheMode;
use crate::store::Variant;

/// `[pattern, left_context, right_context, replacement]`
pub type RawRule = (String, String, String, String);

/// `[regex, [languages], accept]`
pub type RawDetectionRule = (String, Vec<String>, bool);

/// Rule data for one variant, as written in JSON.
///
/// ```json
/// {
///     "@metadata": { ... },  // Ignored
///     "concat": false,
///     "apostrophes": "keep",
///     "languages": ["any", "french"],
///     "discards": ["de la", "d'"],
///     "detection": [["eau", ["french"], true]],
///     "main": { "any": [["ph", "", "", "f"]], "french": [ ... ] },
///     "common": [["aa", "", "", "a"]],
///     "final": { "any": [] }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawVariant {
    #[serde(default)]
    pub concat: bool,
    #[serde(default)]
    pub apostrophes: ApostropheMode,
    pub languages: Vec<String>,
    #[serde(default)]
    pub discards: Vec<String>,
    #[serde(default)]
    pub detection: Vec<RawDetectionRule>,
    pub main: BTreeMap<String, Vec<RawRule>>,
    /// Required, but may be an empty list
    #[serde(default)]
    pub common: Option<Vec<RawRule>>,
    #[serde(rename = "final")]
    pub final_rules: BTreeMap<String, Vec<RawRule>>,
}

/// Parse variant rule data; `origin` is only used in error messages
pub fn parse_variant(json: &str, origin: &Path) -> BmpmResult<RawVariant> {
    serde_json::from_str(json).map_err(|source| BmpmError::Json {
        path: origin.to_path_buf(),
        source,
    })
}

/// Load variant rule data from a single JSON file
pub fn load_variant_from_file(path: &Path) -> BmpmResult<RawVariant> {
    let content = fs::read_to_string(path).map_err(|source| BmpmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_variant(&content, path)
}

/// Load all variant files from a directory.
///
/// The file stem names the variant: `gen.json`, `ash.json`, `sep.json`
/// (long names such as `sephardic.json` work too). Other JSON files are
/// skipped with a warning.
pub fn load_variants_from_dir(dir: &Path) -> BmpmResult<BTreeMap<Variant, RawVariant>> {
    let entries = fs::read_dir(dir).map_err(|source| BmpmError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut variants = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| BmpmError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let Ok(variant) = stem.parse::<Variant>() else {
            warn!(path = %path.display(), "skipping file that names no variant");
            continue;
        };

        debug!(%variant, path = %path.display(), "loading variant rules");
        variants.insert(variant, load_variant_from_file(&path)?);
    }

    Ok(variants)
}

const BUNDLED: [(Variant, &str, &str); 3] = [
    (Variant::Generic, "data/gen.json", include_str!("../data/gen.json")),
    (Variant::Ashkenazi, "data/ash.json", include_str!("../data/ash.json")),
    (Variant::Sephardic, "data/sep.json", include_str!("../data/sep.json")),
];

/// The rule data shipped with the crate
pub fn bundled_variants() -> BmpmResult<BTreeMap<Variant, RawVariant>> {
    BUNDLED
        .iter()
        .map(|(variant, origin, json)| {
            let raw = parse_variant(json, Path::new(origin))?;
            Ok::<_, BmpmError>((*variant, raw))
        })
        .collect()
}
