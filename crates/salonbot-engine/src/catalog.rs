// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Salon catalog (services, units, FAQ, packages) and its option keywords.

use salonbot_config::SalonConfig;
use salonbot_config::model::{FaqConfig, LocationConfig, PackageConfig, ServiceConfig};

use crate::parse::normalize;

/// Words too short or too generic to select an option on their own.
const MIN_NAME_WORD: usize = 4;

/// Main menu options, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Book,
    Services,
    Locations,
    Packages,
    Faq,
    Human,
}

impl MenuOption {
    pub const ALL: [MenuOption; 6] = [
        MenuOption::Book,
        MenuOption::Services,
        MenuOption::Locations,
        MenuOption::Packages,
        MenuOption::Faq,
        MenuOption::Human,
    ];

    fn keywords(self) -> Vec<&'static str> {
        match self {
            MenuOption::Book => vec!["agendar", "agendamento", "marcar", "horario", "reservar"],
            MenuOption::Services => vec!["servicos", "servico", "precos", "preco", "valores", "tabela"],
            MenuOption::Locations => vec!["unidades", "unidade", "endereco", "localizacao", "onde fica"],
            MenuOption::Packages => vec!["pacotes", "pacote", "combo", "promocao"],
            MenuOption::Faq => vec!["duvidas", "duvida", "perguntas", "faq"],
            MenuOption::Human => vec!["atendente", "atendimento"],
        }
    }

    pub fn keyword_table() -> Vec<Vec<&'static str>> {
        Self::ALL.iter().map(|o| o.keywords()).collect()
    }
}

/// Everything the conversation can list or look up.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub services: Vec<ServiceConfig>,
    pub locations: Vec<LocationConfig>,
    pub faq: Vec<FaqConfig>,
    pub packages: Vec<PackageConfig>,
}

impl Catalog {
    pub fn from_config(config: &SalonConfig) -> Self {
        Self {
            services: config.services.clone(),
            locations: config.locations.clone(),
            faq: config.faq.clone(),
            packages: config.packages.clone(),
        }
    }

    pub fn service(&self, id: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn location(&self, id: &str) -> Option<&LocationConfig> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn service_keywords(&self) -> Vec<Vec<String>> {
        self.services
            .iter()
            .map(|s| keywords_for(&s.name, &s.keywords))
            .collect()
    }

    pub fn location_keywords(&self) -> Vec<Vec<String>> {
        self.locations
            .iter()
            .map(|l| keywords_for(&l.name, &l.keywords))
            .collect()
    }

    pub fn faq_keywords(&self) -> Vec<Vec<String>> {
        self.faq
            .iter()
            .map(|f| keywords_for(&f.question, &f.keywords))
            .collect()
    }

    pub fn package_keywords(&self) -> Vec<Vec<String>> {
        self.packages
            .iter()
            .map(|p| keywords_for(&p.name, &[]))
            .collect()
    }
}

/// The full name, its longer words, and any configured extras.
fn keywords_for(name: &str, extra: &[String]) -> Vec<String> {
    let full = normalize(name);
    let mut keywords: Vec<String> = full
        .split(' ')
        .filter(|w| w.chars().count() >= MIN_NAME_WORD)
        .map(str::to_string)
        .collect();
    keywords.push(full);
    keywords.extend(extra.iter().map(|k| normalize(k)));
    keywords.sort();
    keywords.dedup();
    keywords
}
