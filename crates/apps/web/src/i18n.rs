//! Two-language label tables, matching the site's English/Indonesian pages.

use model::FloodState;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    Indonesian,
}

impl Language {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "in" | "id" => Language::Indonesian,
            _ => Language::English,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub hover_prompt: &'static str,
    pub reports_suffix: &'static str,
    pub count_legend_title: &'static str,
    pub severity_legend_title: &'static str,
    pub confirmed_layer: &'static str,
    pub window_hours: [&'static str; 3],
}

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::English => &Labels {
            hover_prompt: "Hover over an area",
            reports_suffix: "reports",
            count_legend_title: "Number of reports",
            severity_legend_title: "Flood states",
            confirmed_layer: "Confirmed Reports",
            window_hours: ["1hr", "3hrs", "6hrs"],
        },
        Language::Indonesian => &Labels {
            hover_prompt: "Arahkan ke area",
            reports_suffix: "laporan",
            count_legend_title: "Jumlah laporan",
            severity_legend_title: "Keadaan banjir",
            confirmed_layer: "Laporan dikonfirmasi",
            window_hours: ["1 jam", "3 jam", "6 jam"],
        },
    }
}

pub fn severity_label(language: Language, state: FloodState) -> &'static str {
    match (language, state) {
        (Language::English, FloodState::Unset) => "No data",
        (Language::English, FloodState::Caution) => "Caution",
        (Language::English, FloodState::Minor) => "Minor flooding",
        (Language::English, FloodState::Moderate) => "Moderate flooding",
        (Language::English, FloodState::Severe) => "Severe flooding",
        (Language::Indonesian, FloodState::Unset) => "Tidak ada data",
        (Language::Indonesian, FloodState::Caution) => "Waspada",
        (Language::Indonesian, FloodState::Minor) => "Banjir ringan",
        (Language::Indonesian, FloodState::Moderate) => "Banjir sedang",
        (Language::Indonesian, FloodState::Severe) => "Banjir berat",
    }
}
