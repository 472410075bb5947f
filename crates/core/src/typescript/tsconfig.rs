use crate::error::{Error, Result};
use crate::paths;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Parsed configs keyed by their workspace-relative path. `None` marks a
/// config that is being parsed or failed to parse.
pub type ParsedConfigs = HashMap<String, Option<Arc<TsConfig>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CompilerOptionsJson {
    out_dir: Option<String>,
    root_dir: Option<String>,
    root_dirs: Option<Vec<String>>,
    base_url: Option<String>,
    paths: Option<IndexMap<String, Vec<String>>>,
    types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtendsJson {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct ReferenceJson {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TsConfigJson {
    extends: Option<ExtendsJson>,
    compiler_options: CompilerOptionsJson,
    references: Vec<ReferenceJson>,
}

/// `compilerOptions.paths` along with the directory its values are relative to
#[derive(Debug, Clone)]
pub struct TsConfigPaths {
    /// Directory the mapped values are relative to, from the config directory
    pub rel: String,
    /// Patterns in declaration order
    pub map: Arc<IndexMap<String, Vec<String>>>,
}

impl Default for TsConfigPaths {
    fn default() -> Self {
        Self {
            rel: ".".to_string(),
            map: Arc::new(IndexMap::new()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TsConfig {
    /// Workspace-relative directory of the tsconfig file
    pub config_dir: String,
    /// Name of the tsconfig file within `config_dir`
    pub config_name: String,

    pub root_dir: String,
    pub out_dir: String,
    /// Only set when declared explicitly
    pub base_url: Option<String>,

    pub paths: TsConfigPaths,
    pub virtual_root_dirs: Vec<String>,

    pub extends: String,
    pub references: Vec<String>,
    pub types: Vec<String>,
}

struct PatternMatch<'a> {
    prefix: &'a str,
    suffix: &'a str,
    values: &'a [String],
}

impl TsConfig {
    /// Expand an import to every path it may refer to under this config, in
    /// priority order and without duplicates. The import itself is always first.
    ///
    /// Wildcard patterns are prioritized like TypeScript and esbuild do: longer
    /// prefixes first, then longer suffixes.
    pub fn expand_paths(&self, import_path: &str) -> Vec<String> {
        let mut possible = vec![import_path.to_string()];
        let map = &self.paths.map;

        // Exact 'paths' matches first
        if let Some(exact) = map.get(import_path).filter(|_| !import_path.contains('*')) {
            trace!("TsConfig.paths exact matches for {:?}: {:?}", import_path, exact);
            for value in exact {
                possible.push(self.map_path(value));
            }
        }

        // Pattern matches next
        let mut matches: Vec<PatternMatch<'_>> = map
            .iter()
            .filter_map(|(key, values)| {
                let (prefix, suffix) = key.split_once('*')?;
                let fits = import_path.len() >= prefix.len() + suffix.len()
                    && import_path.starts_with(prefix)
                    && import_path.ends_with(suffix);
                fits.then_some(PatternMatch {
                    prefix,
                    suffix,
                    values,
                })
            })
            .collect();

        // Stable, so equally specific patterns keep their declaration order
        matches.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| b.suffix.len().cmp(&a.suffix.len()))
        });

        for m in &matches {
            let matched = &import_path[m.prefix.len()..import_path.len() - m.suffix.len()];
            trace!("TsConfig.paths pattern {}*{} matches {:?}", m.prefix, m.suffix, matched);
            for value in m.values {
                possible.push(self.map_path(&value.replacen('*', matched, 1)));
            }
        }

        // baseUrl only applies to non-relative imports
        if let Some(base_url) = &self.base_url {
            if !paths::is_relative(import_path) && !paths::is_abs(import_path) {
                possible.push(paths::join(&[self.config_dir.as_str(), base_url, import_path]));
            }
        }

        // rootDirs act as one merged virtual directory
        possible.extend(self.expand_root_dirs(import_path));

        let mut seen = std::collections::HashSet::new();
        possible.retain(|p| seen.insert(p.clone()));
        possible
    }

    fn map_path(&self, value: &str) -> String {
        if paths::is_abs(value) {
            return paths::clean(value);
        }
        paths::join(&[self.config_dir.as_str(), &self.paths.rel, value])
    }

    fn expand_root_dirs(&self, import_path: &str) -> Vec<String> {
        let roots: Vec<String> = self
            .virtual_root_dirs
            .iter()
            .map(|d| paths::join(&[self.config_dir.as_str(), d]))
            .collect();

        let Some((owner, rest)) = roots.iter().enumerate().find_map(|(i, root)| {
            let rest = if root.is_empty() {
                Some(import_path)
            } else {
                import_path
                    .strip_prefix(root.as_str())
                    .and_then(|r| r.strip_prefix('/'))
            };
            rest.map(|r| (i, r))
        }) else {
            return Vec::new();
        };

        roots
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != owner)
            .map(|(_, root)| paths::join(&[root.as_str(), rest]))
            .collect()
    }
}

/// Candidate files a tsconfig `extends` value may refer to from `dir`.
pub fn extends_candidates(dir: &str, conf: &str) -> Vec<String> {
    let mut candidates = vec![paths::join(&[dir, conf])];
    if !conf.ends_with(".json") {
        candidates.push(paths::join(&[dir, &format!("{conf}.json")]));
    }

    // Named configs from packages such as `@tsconfig/node20`
    if !paths::is_relative(conf) && !paths::is_abs(conf) {
        for ancestor in paths::ancestors(dir) {
            let modules = paths::join(&[ancestor.as_str(), "node_modules", conf]);
            if !conf.ends_with(".json") {
                candidates.push(format!("{modules}.json"));
            }
            candidates.push(paths::join(&[modules.as_str(), "tsconfig.json"]));
            candidates.push(modules);
        }
    }

    candidates
}

/// Load a tsconfig file, following `extends`. Recursion is detected via the
/// entries already present in `parsed`.
pub fn parse_tsconfig_file(
    parsed: &mut ParsedConfigs,
    root: &Path,
    dir: &str,
    name: &str,
) -> Result<Option<Arc<TsConfig>>> {
    let key = paths::join(&[dir, name]);

    match parsed.get(&key) {
        Some(None) => {
            warn!("Recursive tsconfig file extension: {:?}", key);
            return Ok(None);
        }
        Some(Some(existing)) => return Ok(Some(existing.clone())),
        None => {}
    }

    // Marked before parsing so extending the same file is detected
    parsed.insert(key.clone(), None);

    for candidate in extends_candidates(dir, name) {
        let content = match std::fs::read_to_string(root.join(&candidate)) {
            Ok(content) => content,
            Err(e) => {
                trace!("TsConfig lookup of {:?} from {:?} as {:?} not found: {}", name, dir, candidate, e);
                continue;
            }
        };

        let config_dir = paths::normalize_dir(&paths::dir(&candidate));
        let config_name = paths::base(&candidate).to_string();
        let config = Arc::new(parse_tsconfig_json(parsed, root, &config_dir, &config_name, &content)?);

        parsed.insert(key, Some(config.clone()));
        return Ok(Some(config));
    }

    Err(Error::ConfigParse {
        path: key,
        message: format!("tsconfig {name:?} from {dir:?} not found"),
    })
}

/// Parse the content of a tsconfig located at `config_dir/config_name`.
pub fn parse_tsconfig_json(
    parsed: &mut ParsedConfigs,
    root: &Path,
    config_dir: &str,
    config_name: &str,
    content: &str,
) -> Result<TsConfig> {
    let config_path = paths::join(&[config_dir, config_name]);
    let json: TsConfigJson = json5::from_str(content).map_err(|e| Error::ConfigParse {
        path: config_path.clone(),
        message: e.to_string(),
    })?;

    let extends_value = match json.extends {
        Some(ExtendsJson::One(s)) => s,
        Some(ExtendsJson::Many(all)) => all.last().cloned().unwrap_or_default(),
        None => String::new(),
    };

    let mut base: Option<Arc<TsConfig>> = None;
    let mut extends = String::new();
    if !extends_value.is_empty() {
        match parse_tsconfig_file(parsed, root, config_dir, &extends_value) {
            Ok(Some(config)) => {
                extends = paths::clean(&extends_value);
                base = Some(config);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load base tsconfig file {:?} from {:?}: {}", extends_value, config_path, e),
        }
    }

    let options = json.compiler_options;

    let references = json
        .references
        .iter()
        .filter(|r| !r.path.is_empty())
        .map(|r| paths::join(&[config_dir, r.path.as_str()]))
        .collect();

    let base_rel = base
        .as_ref()
        .map(|b| paths::rel(config_dir, &b.config_dir))
        .unwrap_or_else(|| ".".to_string());

    let base_url = options.base_url.as_deref().map(paths::clean);

    let config_paths = match (options.paths, &base) {
        (Some(map), _) => TsConfigPaths {
            rel: base_url.clone().unwrap_or_else(|| ".".to_string()),
            map: Arc::new(valid_patterns(&config_path, map)),
        },
        (None, Some(base)) => TsConfigPaths {
            rel: paths::clean(&paths::join(&[base_rel.as_str(), &base.paths.rel])),
            map: base.paths.map.clone(),
        },
        (None, None) => TsConfigPaths::default(),
    };

    let virtual_root_dirs = match (options.root_dirs, &base) {
        (Some(dirs), _) => dirs.iter().map(|d| paths::clean(d)).collect(),
        (None, Some(base)) => base
            .virtual_root_dirs
            .iter()
            .map(|d| paths::clean(&paths::join(&[base_rel.as_str(), d])))
            .collect(),
        (None, None) => Vec::new(),
    };

    debug!("Parsed tsconfig {:?}", config_path);

    Ok(TsConfig {
        config_dir: config_dir.to_string(),
        config_name: config_name.to_string(),
        root_dir: options.root_dir.as_deref().map(paths::clean).unwrap_or_else(|| ".".to_string()),
        out_dir: options.out_dir.as_deref().map(paths::clean).unwrap_or_else(|| ".".to_string()),
        base_url,
        paths: config_paths,
        virtual_root_dirs,
        extends,
        references,
        types: options.types.unwrap_or_default(),
    })
}

fn valid_patterns(config_path: &str, map: IndexMap<String, Vec<String>>) -> IndexMap<String, Vec<String>> {
    map.into_iter()
        .filter(|(pattern, _)| {
            let valid = pattern.matches('*').count() <= 1;
            if !valid {
                warn!("Ignoring tsconfig paths pattern {:?} in {:?}: at most one '*' is allowed", pattern, config_path);
            }
            valid
        })
        .collect()
}
