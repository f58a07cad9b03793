//! Internationalization (i18n) support
//!
//! English and Brazilian Portuguese strings are built in. A site can override
//! any key with `languages/{lang}.yml`.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

type Table = HashMap<String, serde_yaml::Value>;

const BUILTIN: &[(&str, &str)] = &[
    ("en", include_str!("en.yml")),
    ("pt-BR", include_str!("pt-BR.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, Table>,
}

impl I18n {
    /// Create a handler for `language` with the built-in tables loaded
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN {
            match serde_yaml::from_str::<Table>(source) {
                Ok(table) => {
                    translations.insert(lang.to_string(), table);
                }
                Err(e) => tracing::error!("Built-in language {} is invalid: {}", lang, e),
            }
        }

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Merge `{lang}.yml` files from a directory over the loaded tables
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<Table>(&content) {
                Ok(data) => {
                    self.translations
                        .entry(lang.to_string())
                        .or_default()
                        .extend(data);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key. Key can be nested like "not_found.title"
    pub fn get(&self, key: &str) -> String {
        self.lookup(key)
            .map(yaml_value_to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a translation and substitute `%d` with `count`
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// Localized month name for `month` in 1..=12
    pub fn month_name(&self, month: u32, long: bool) -> String {
        let key = if long { "months.long" } else { "months.short" };
        let index = month.saturating_sub(1) as usize;

        [self.language.as_str(), "en"]
            .iter()
            .filter_map(|lang| self.translations.get(*lang))
            .filter_map(|table| match get_nested_value(table, key) {
                Some(serde_yaml::Value::Sequence(names)) => names.get(index),
                _ => None,
            })
            .map(yaml_value_to_string)
            .next()
            .unwrap_or_else(|| format!("{:02}", month))
    }

    /// Scalar translations for the current language, with English filling gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();

        if let Some(lang_data) = self.translations.get(&self.language) {
            flatten_translations(lang_data, "", &mut result);
        }

        if self.language != "en" {
            if let Some(en_data) = self.translations.get("en") {
                let mut en_result = HashMap::new();
                flatten_translations(en_data, "", &mut en_result);
                for (k, v) in en_result {
                    result.entry(k).or_insert(v);
                }
            }
        }

        result
    }

    fn lookup(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.translations
            .get(&self.language)
            .and_then(|data| get_nested_value(data, key))
            .or_else(|| {
                self.translations
                    .get("en")
                    .and_then(|data| get_nested_value(data, key))
            })
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(data: &'a Table, key: &str) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?);

    for part in parts {
        current = match current {
            Some(serde_yaml::Value::Mapping(map)) => map.get(part),
            _ => return None,
        };
    }

    current
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

/// Flatten scalar translations into dot-notation keys; sequences are skipped
fn flatten_translations(data: &Table, prefix: &str, result: &mut HashMap<String, String>) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::String(_)
            | serde_yaml::Value::Number(_)
            | serde_yaml::Value::Bool(_) => {
                result.insert(full_key, yaml_value_to_string(value));
            }
            serde_yaml::Value::Mapping(map) => {
                let nested: Table = map
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_translations() {
        let pt = I18n::new("pt-BR");
        assert_eq!(pt.get("load_more"), "Carregar mais posts");
        assert_eq!(pt.get("not_found.title"), "Post não encontrado");
        assert_eq!(pt.get_count("reading_time", 4), "4 min");

        let en = I18n::default();
        assert_eq!(en.get("load_more"), "Load more posts");
        assert_eq!(en.get("unknown"), "unknown");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let i18n = I18n::new("de");
        assert_eq!(i18n.get("loading"), "Loading...");
        assert_eq!(i18n.month_name(3, false), "Mar");
    }

    #[test]
    fn test_month_names() {
        let pt = I18n::new("pt-BR");
        assert_eq!(pt.month_name(3, false), "mar");
        assert_eq!(pt.month_name(12, false), "dez");
        assert_eq!(pt.month_name(3, true), "março");
        assert_eq!(pt.month_name(13, false), "13");
    }

    #[test]
    fn test_load_language_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt-BR.yml"),
            "load_more: Ver mais\nnot_found:\n  title: Nada aqui\n",
        )
        .unwrap();

        let mut i18n = I18n::new("pt-BR");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("load_more"), "Ver mais");
        assert_eq!(i18n.get("not_found.title"), "Nada aqui");
        assert_eq!(i18n.get("loading"), "Carregando...");
    }

    #[test]
    fn test_get_all_translations() {
        let all = I18n::new("pt-BR").get_all_translations();
        assert_eq!(all.get("loading"), Some(&"Carregando...".to_string()));
        assert_eq!(
            all.get("error.title"),
            Some(&"Algo deu errado".to_string())
        );
        assert!(!all.contains_key("months.short"));
    }
}
