//! Project repositories payload returned by `/batch/project`

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Quality profile a project is analysed with
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QProfile {
    pub key: String,
    pub name: String,
    pub language: String,
    #[serde(rename = "lastUsed", default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
}

impl QProfile {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            language: language.into(),
            last_used: None,
        }
    }

    pub fn with_last_used(mut self, last_used: impl Into<String>) -> Self {
        self.last_used = Some(last_used.into());
        self
    }
}

/// Rule enabled for the analysis, with its configured severity and parameters
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActiveRule {
    #[serde(rename = "repositoryKey", default)]
    pub repository_key: String,
    #[serde(rename = "ruleKey", default)]
    pub rule_key: String,
    #[serde(rename = "templateRuleKey", default, skip_serializing_if = "Option::is_none")]
    pub template_rule_key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(rename = "internalKey", default, skip_serializing_if = "Option::is_none")]
    pub internal_key: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ActiveRule {
    /// `repository:rule`, the key used for rules sent as a list
    pub fn full_key(&self) -> String {
        format!("{}:{}", self.repository_key, self.rule_key)
    }
}

/// Per-file data known by the server from the previous analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileData {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(rename = "needBlame", default)]
    pub need_blame: bool,
}

/// Everything the batch needs from the server before analysing a project
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectRepositories {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "lastAnalysisDate", default, skip_serializing_if = "Option::is_none")]
    pub last_analysis_date: Option<String>,
    #[serde(rename = "qualityProfiles", default, deserialize_with = "unique_profiles")]
    quality_profiles: Vec<QProfile>,
    #[serde(rename = "activeRules", default, deserialize_with = "active_rules_by_key")]
    active_rules: BTreeMap<String, ActiveRule>,
    #[serde(rename = "settingsByModule", default, deserialize_with = "null_as_default")]
    settings_by_module: HashMap<String, HashMap<String, String>>,
    #[serde(
        rename = "fileDataByModuleAndPath",
        alias = "fileDataByPath",
        default,
        deserialize_with = "null_as_default"
    )]
    file_data_by_module_and_path: HashMap<String, HashMap<String, FileData>>,
}

impl ProjectRepositories {
    pub fn quality_profiles(&self) -> &[QProfile] {
        &self.quality_profiles
    }

    pub fn q_profile(&self, key: &str) -> Option<&QProfile> {
        self.quality_profiles.iter().find(|p| p.key == key)
    }

    pub fn q_profiles_by_language(&self, language: &str) -> Vec<&QProfile> {
        self.quality_profiles
            .iter()
            .filter(|p| p.language == language)
            .collect()
    }

    pub fn active_rules(&self) -> &BTreeMap<String, ActiveRule> {
        &self.active_rules
    }

    pub fn active_rule(&self, key: &str) -> Option<&ActiveRule> {
        self.active_rules.get(key)
    }

    /// Settings of a module; `None` when the server sent none
    pub fn settings(&self, module_key: &str) -> Option<&HashMap<String, String>> {
        self.settings_by_module.get(module_key)
    }

    /// File data keyed by path for the given module/project key
    pub fn file_data_by_path(&self, key: &str) -> Option<&HashMap<String, FileData>> {
        self.file_data_by_module_and_path.get(key)
    }

    pub fn file_data(&self, module_key: &str, path: &str) -> Option<&FileData> {
        self.file_data_by_module_and_path
            .get(module_key)
            .and_then(|files| files.get(path))
    }

    /// Total number of file entries across all modules
    pub fn file_count(&self) -> usize {
        self.file_data_by_module_and_path.values().map(HashMap::len).sum()
    }

    // Builders below are used to assemble payloads on the producing side and in tests.

    pub fn add_q_profile(&mut self, profile: QProfile) -> &mut Self {
        self.quality_profiles.retain(|p| p.key != profile.key);
        self.quality_profiles.push(profile);
        self
    }

    pub fn add_active_rule(&mut self, key: impl Into<String>, rule: ActiveRule) -> &mut Self {
        self.active_rules.insert(key.into(), rule);
        self
    }

    pub fn add_setting(
        &mut self,
        module_key: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.settings_by_module
            .entry(module_key.into())
            .or_default()
            .insert(property.into(), value.into());
        self
    }

    pub fn add_file_data(
        &mut self,
        module_key: impl Into<String>,
        path: impl Into<String>,
        data: FileData,
    ) -> &mut Self {
        self.file_data_by_module_and_path
            .entry(module_key.into())
            .or_default()
            .insert(path.into(), data);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn unique_profiles<'de, D>(deserializer: D) -> Result<Vec<QProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let profiles = Option::<Vec<QProfile>>::deserialize(deserializer)?.unwrap_or_default();
    let mut seen = std::collections::HashSet::new();
    for profile in &profiles {
        if !seen.insert(profile.key.as_str()) {
            return Err(serde::de::Error::custom(format!(
                "duplicate quality profile key '{}'",
                profile.key
            )));
        }
    }
    Ok(profiles)
}

/// Rules come either keyed by rule key or, in the older protocol, as a plain list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ActiveRulesRepr {
    ByKey(BTreeMap<String, ActiveRule>),
    List(Vec<ActiveRule>),
}

fn active_rules_by_key<'de, D>(deserializer: D) -> Result<BTreeMap<String, ActiveRule>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ActiveRulesRepr>::deserialize(deserializer)? {
        Some(ActiveRulesRepr::ByKey(rules)) => rules,
        Some(ActiveRulesRepr::List(rules)) => rules.into_iter().map(|r| (r.full_key(), r)).collect(),
        None => BTreeMap::new(),
    })
}

/// `null` reads the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
