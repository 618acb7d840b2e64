//! Filter and preference definitions in the shape the host renders.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ALLMANGA_URL, Preferences};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub type_name: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectFilter {
    pub type_name: String,
    pub name: String,
    pub state: usize,
    pub values: Vec<SelectOption>,
}

impl SelectFilter {
    fn new(name: &str, items: &[&str], values: &[&str]) -> Self {
        Self {
            type_name: "SelectFilter".to_string(),
            name: name.to_string(),
            state: 0,
            values: items
                .iter()
                .zip(values)
                .map(|(item, value)| SelectOption {
                    type_name: "SelectOption".to_string(),
                    name: item.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    /// Value of the selected option; empty when `state` is out of range.
    pub fn selected(&self) -> &str {
        self.values
            .get(self.state)
            .map(|option| option.value.as_str())
            .unwrap_or_default()
    }

    /// Moves `state` to the option whose value or name matches `wanted`.
    pub fn select(&mut self, wanted: &str) -> bool {
        let found = self.values.iter().position(|option| {
            option.value.eq_ignore_ascii_case(wanted) || option.name.eq_ignore_ascii_case(wanted)
        });
        if let Some(idx) = found {
            self.state = idx;
        }
        found.is_some()
    }
}

pub fn filter_list() -> Vec<SelectFilter> {
    vec![
        SelectFilter::new("Type", &["All", "Sub", "Dub"], &["", "sub", "dub"]),
        SelectFilter::new(
            "Country",
            &["All", "Japan", "China", "Korea"],
            &["ALL", "Japan", "China", "Korea"],
        ),
    ]
}

/// `(type, country)` selected in a filter list laid out like [`filter_list`].
pub fn selected_type_and_country(filters: &[SelectFilter]) -> (String, String) {
    let pick = |idx: usize| {
        filters
            .get(idx)
            .map(|filter| filter.selected().to_string())
            .unwrap_or_default()
    };
    (pick(0), pick(1))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceEditor {
    #[serde(rename_all = "camelCase")]
    EditTextPreference {
        title: String,
        summary: String,
        value: String,
        dialog_title: String,
        dialog_message: String,
    },
    #[serde(rename_all = "camelCase")]
    MultiSelectListPreference {
        title: String,
        summary: String,
        values: Vec<String>,
        entries: Vec<String>,
        entry_values: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    ListPreference {
        title: String,
        summary: String,
        value_index: usize,
        entries: Vec<String>,
        entry_values: Vec<String>,
    },
    SwitchPreferenceCompat {
        title: String,
        summary: String,
        value: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePreference {
    pub key: String,
    #[serde(flatten)]
    pub editor: PreferenceEditor,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Preference editors for the AllManga source. Defaults come from
/// [`Preferences::default`].
pub fn source_preferences() -> Vec<SourcePreference> {
    let defaults = Preferences::default();
    vec![
        SourcePreference {
            key: "allmanga_base_url".to_string(),
            editor: PreferenceEditor::EditTextPreference {
                title: "Override base url".to_string(),
                summary: String::new(),
                value: DEFAULT_ALLMANGA_URL.to_string(),
                dialog_title: "Override base url".to_string(),
                dialog_message: String::new(),
            },
        },
        SourcePreference {
            key: "allmanga_popular_latest_type".to_string(),
            editor: PreferenceEditor::MultiSelectListPreference {
                title: "Preferred type for popular & latest".to_string(),
                summary: "Choose which type of anime to show in popular & latest".to_string(),
                values: defaults
                    .popular_latest_type
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
                entries: strings(&["Sub", "Dub"]),
                entry_values: strings(&["sub", "dub"]),
            },
        },
        SourcePreference {
            key: "allmanga_title_lang".to_string(),
            editor: PreferenceEditor::ListPreference {
                title: "Preferred title language".to_string(),
                summary: "Choose which title to display".to_string(),
                value_index: 0,
                entries: strings(&["Default", "Japanese"]),
                entry_values: strings(&["title", "data-jp"]),
            },
        },
        SourcePreference {
            key: "allmanga_pref_ep_thumbnail".to_string(),
            editor: PreferenceEditor::SwitchPreferenceCompat {
                title: "Episode thumbnail".to_string(),
                summary: "Show episode thumbnails if available".to_string(),
                value: defaults.ep_thumbnail,
            },
        },
        SourcePreference {
            key: "allmanga_pref_ep_description".to_string(),
            editor: PreferenceEditor::SwitchPreferenceCompat {
                title: "Episode description".to_string(),
                summary: "Show episode descriptions if available".to_string(),
                value: defaults.ep_description,
            },
        },
    ]
}
