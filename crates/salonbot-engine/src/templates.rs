// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in pt-BR message copy with config overrides.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use salonbot_core::{MessageKey, MessageTemplates, SalonError};

/// Template catalog: built-in copy for every [`MessageKey`], optionally
/// replaced per key from the `[templates]` config section.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    overrides: HashMap<MessageKey, String>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from `key = "text"` overrides.
    ///
    /// Fails on the first key that is not a known message key.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, SalonError> {
        let overrides = overrides
            .iter()
            .map(|(key, text)| {
                MessageKey::from_str(key)
                    .map(|k| (k, text.clone()))
                    .map_err(|_| SalonError::Template { key: key.clone() })
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { overrides })
    }

    fn raw(&self, key: MessageKey) -> &str {
        self.overrides
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| default_copy(key))
    }
}

impl MessageTemplates for TemplateCatalog {
    fn get_message(&self, key: MessageKey, replacements: &[(&str, String)]) -> String {
        render(self.raw(key), replacements)
    }
}

/// Substitutes `{name}` placeholders. Unknown placeholders are left as is.
pub fn render(template: &str, replacements: &[(&str, String)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

/// `R$ 1.234,50` style amount.
pub fn format_brl(cents: u64) -> String {
    let reais = (cents / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, digit) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    format!("R$ {grouped},{:02}", cents % 100)
}

fn default_copy(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        Welcome => "Olá! 💇‍♀️ Bem-vinda ao {salon}. Sou a assistente virtual e vou te ajudar por aqui.",
        MainMenu => "Como posso ajudar? Responda com o número:\n\
                     1. Agendar horário\n\
                     2. Serviços e preços\n\
                     3. Nossas unidades\n\
                     4. Pacotes\n\
                     5. Dúvidas frequentes\n\
                     6. Falar com uma atendente",
        Clarify => "Desculpe, não entendi. 😅 Responda com o número de uma das opções ou digite 0 para voltar ao menu.",
        BackToMenu => "Tudo bem, voltando ao menu.",
        ServicesHeader => "Nossos serviços:",
        ServiceLine => "{index}. {name} ({price})",
        ServiceDetail => "*{name}* ({price}, cerca de {duration} min)\n{description}\n\nDigite 1 para agendar ou 0 para voltar.",
        PickServicePrompt => "Qual serviço você gostaria de agendar?",
        PickLocationPrompt => "Em qual unidade?",
        LocationLine => "{index}. {name} ({address})",
        SlotsHeader => "Horários disponíveis na unidade {location}:",
        SlotLine => "{index}. {date} às {time}",
        NoSlots => "Não encontrei horários livres na unidade {location} nos próximos dias. Quer entrar na lista de espera? (1. Sim / 2. Não)",
        WaitingListJoined => "Pronto! Você está na lista de espera e avisaremos assim que abrir um horário.",
        WaitingListDeclined => "Sem problemas. Se precisar, é só chamar!",
        AskName => "Ótimo! Qual é o seu nome completo?",
        InvalidName => "Não consegui entender o nome. Pode digitar só o seu nome, sem números?",
        AskBirthdate => "Obrigada, {name}! Qual é a sua data de nascimento? (ex.: 15/03/1990)",
        InvalidBirthdate => "Data inválida. Digite no formato DD/MM/AAAA, por favor.",
        MinorHandoff => "Para menores de idade, o agendamento é feito com uma de nossas atendentes. Ela vai falar com você em instantes!",
        ConfirmSummary => "Confira os dados:\n✂️ {service}\n📍 {location}\n📅 {date} às {time}\n👤 {name}\n\nPosso confirmar? (1. Sim / 2. Não)",
        Booked => "Agendamento confirmado! ✅ {service} em {date} às {time}, unidade {location}.",
        PixPayment => "Para garantir o horário, faça o sinal de {amount} via Pix copia e cola:\n{code}",
        BookingFailed => "Tivemos um problema ao consultar a agenda. Pode tentar de novo em instantes?",
        BookingAborted => "Agendamento cancelado. Se quiser, podemos recomeçar pelo menu.",
        RecurrenceOffer => "Quer deixar o mesmo horário reservado para as próximas {count} semanas ({dates})? Total de {total}. (1. Sim / 2. Não)",
        RecurrenceBooked => "Feito! Reservamos mais {count} horário(s), total de {total}.",
        RecurrenceNoneBooked => "Que pena, os horários das próximas semanas acabaram de ser ocupados. Seu primeiro agendamento continua garantido.",
        RecurrenceDeclined => "Tudo certo! Seu agendamento está garantido.",
        RecurrenceRetry => "Não entendi. Quer reservar os próximos horários? Responda 1 para sim ou 2 para não.",
        FaqHeader => "Dúvidas frequentes:",
        FaqLine => "{index}. {question}",
        FaqAnswer => "*{question}*\n{answer}\n\nEscolha outra pergunta ou digite 0 para voltar.",
        LocationsHeader => "Nossas unidades:",
        LocationDetail => "📍 *{name}*\n{address}",
        PackagesHeader => "Nossos pacotes:",
        PackageLine => "{index}. {name} ({price})",
        PackageDetail => "*{name}* ({price})\n{description}",
        HumanHandoff => "Certo! Vou chamar uma atendente para continuar com você. 👩‍💼",
        OptOutConfirmed => "Você não receberá mais mensagens automáticas. Para voltar, é só mandar um oi.",
        ConfirmationRequest => "Olá, {name}! Lembrete do seu horário: {service} em {date} às {time}. Você confirma? (1. Sim / 2. Cancelar)",
        AppointmentConfirmed => "Presença confirmada! Até lá. 💖",
        AppointmentCancelled => "Seu horário foi cancelado. Quando quiser remarcar, é só chamar!",
        FeedbackRequest => "Como foi o seu atendimento de {service}? Dê uma nota de 1 a 5.",
        FeedbackThanks => "Obrigada pela nota {rating}! Sua opinião é muito importante para nós.",
        OperatorHumanRequested => "Cliente {sender} pediu atendimento humano: \"{text}\"",
        OperatorMinorBooking => "Cliente {sender} ({age} anos) tentou agendar {service}. Atendimento humano necessário.",
        OperatorUnmatchedConfirmation => "Cliente {sender} respondeu ao lembrete sem confirmar: \"{text}\"",
        OperatorUnmatchedFeedback => "Cliente {sender} respondeu à pesquisa sem nota: \"{text}\"",
    }
}
