
use common::config::CountryEntry;

#[derive(Debug, Clone, PartialEq)]
pub struct CountryQueries {
    pub country: String,
    pub phrases: Vec<String>,
}

/// Countries in table order, each with its ordered phrase variants.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CountryQueries>,
}

impl Catalog {
    pub fn new(entries: Vec<CountryQueries>) -> Self {
        Self { entries }
    }

    pub fn from_countries(countries: &[CountryEntry]) -> Self {
        countries
            .iter()
            .map(|entry| (entry.name.clone(), query_variations(entry)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryQueries> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_phrases(&self) -> usize {
        self.entries.iter().map(|e| e.phrases.len()).sum()
    }

    pub fn phrases_for(&self, country: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.country == country)
            .map(|e| e.phrases.as_slice())
    }
}

impl<C: Into<String>, P: Into<String>> FromIterator<(C, Vec<P>)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (C, Vec<P>)>>(iter: I) -> Self {
        Catalog::new(
            iter.into_iter()
                .map(|(country, phrases)| CountryQueries {
                    country: country.into(),
                    phrases: phrases.into_iter().map(Into::into).collect(),
                })
                .collect(),
        )
    }
}

/// Russian then English phrasings, optional variants last.
pub fn query_variations(entry: &CountryEntry) -> Vec<String> {
    let name = &entry.name;
    let name_en = &entry.name_en;

    let mut variations = vec![
        format!("впн {}", name),
        format!("{} впн", name),
        format!("{} впн", entry.adjective_ru),
        format!("впн для {}", name),
        format!("vpn {}", name_en),
        format!("{} vpn", name_en),
        format!("{} vpn", entry.adjective_en),
        format!("vpn for {}", name_en),
    ];

    if let Some(alt) = &entry.adjective_ru_alt {
        variations.push(format!("{} впн", alt));
    }
    if let Some(short) = &entry.name_ru_short {
        variations.push(format!("впн {}", short));
    }

    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turkey() -> CountryEntry {
        CountryEntry {
            name: "Турция".to_string(),
            name_en: "Turkey".to_string(),
            adjective_ru: "турецкий".to_string(),
            adjective_ru_alt: Some("турецкая".to_string()),
            name_ru_short: None,
            adjective_en: "turkish".to_string(),
        }
    }

    #[test]
    fn test_variations_order() {
        let variations = query_variations(&turkey());
        assert_eq!(variations.len(), 9);
        assert_eq!(variations[0], "впн Турция");
        assert_eq!(variations[4], "vpn Turkey");
        assert_eq!(variations[7], "vpn for Turkey");
        assert_eq!(variations[8], "турецкая впн");
    }

    #[test]
    fn test_catalog_keeps_table_order() {
        let mut uae = turkey();
        uae.name = "Объединенные Арабские Эмираты".to_string();
        uae.name_ru_short = Some("оаэ".to_string());
        uae.adjective_ru_alt = None;

        let catalog = Catalog::from_countries(&[turkey(), uae]);
        let countries: Vec<&str> = catalog.iter().map(|e| e.country.as_str()).collect();
        assert_eq!(countries, vec!["Турция", "Объединенные Арабские Эмираты"]);
        assert_eq!(catalog.total_phrases(), 18);
        assert_eq!(
            catalog.phrases_for("Объединенные Арабские Эмираты").unwrap().last().unwrap(),
            "впн оаэ"
        );
    }
}
