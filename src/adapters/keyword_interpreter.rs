use crate::core::Interpreter;
use crate::domain::intent::TripIntent;
use crate::domain::model::ServiceKind;
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

pub const DEFAULT_ORIGIN: &str = "Singapore";
pub const DEFAULT_DESTINATION: &str = "London";

const CAR_TYPES: [&str; 5] = ["compact", "sedan", "suv", "luxury", "convertible"];

/// 地名擷取遇到這些字即停止
const STOP_WORDS: [&str; 22] = [
    "on", "for", "next", "tomorrow", "with", "and", "near", "from", "in", "to", "at", "by",
    "book", "booking", "rent", "renting", "returning", "staying", "stay", "then", "please", "plus",
];

struct Patterns {
    flight: Regex,
    hotel: Regex,
    car: Regex,
    party: Regex,
    date: Regex,
    from_to: Regex,
    in_to: Regex,
    near: Regex,
}

/// 以關鍵字規則解析旅遊需求，不需外部服務
pub struct KeywordInterpreter {
    patterns: Patterns,
    today: Option<NaiveDate>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PlannerError::ConfigError {
        message: format!("invalid interpreter pattern '{}': {}", pattern, e),
    })
}

impl KeywordInterpreter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: Patterns {
                flight: compile(r"\b(?:flights?|fly|flying|tickets?)\b")?,
                hotel: compile(r"\b(?:hotels?|stay|staying|accommodations?)\b")?,
                car: compile(r"\b(?:cars?|rentals?|drive|driving)\b")?,
                party: compile(r"\b(\d+)\s+(?:people|persons?|passengers?|guests?|travell?ers?)\b")?,
                date: compile(r"\b(\d{4}-\d{2}-\d{2})\b")?,
                from_to: compile(r"\bfrom\s+([a-z][a-z\s-]*?)\s+to\s+([a-z][a-z\s-]*)")?,
                in_to: compile(r"\b(?:in|to)\s+([a-z][a-z\s-]*)")?,
                near: compile(r"\bnear\s+([a-z][a-z\s-]*)")?,
            },
            today: None,
        })
    }

    /// 固定「今天」的日期，讓相對日期可預測
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn parse(&self, query: &str) -> Result<TripIntent> {
        let text = query.to_lowercase();
        let p = &self.patterns;

        let services: Vec<ServiceKind> = [
            (ServiceKind::Flight, &p.flight),
            (ServiceKind::Hotel, &p.hotel),
            (ServiceKind::CarRental, &p.car),
        ]
        .into_iter()
        .filter(|(_, re)| re.is_match(&text))
        .map(|(kind, _)| kind)
        .collect();

        if services.is_empty() {
            return Err(PlannerError::interpretation(format!(
                "no flight, hotel or car rental request found in '{}'",
                query.trim()
            )));
        }

        let party_size = p
            .party
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);

        let (start_date, end_date) = self.dates(&text);
        let (origin, destination) = self.places(&text);

        let hotel_preference = p
            .near
            .captures(&text)
            .map(|caps| trim_place(&caps[1]))
            .filter(|place| !place.is_empty())
            .map(|place| format!("Near {}", title_case(&place)));

        let car_type = CAR_TYPES
            .iter()
            .find(|car_type| text.contains(*car_type))
            .map(|car_type| title_case(car_type));

        let intent = TripIntent::new(origin, destination, start_date, end_date, party_size, services)?
            .with_hotel_preference(hotel_preference)
            .with_car_type(car_type);
        tracing::debug!("🧩 Keyword interpretation: {:?}", intent);
        Ok(intent)
    }

    fn dates(&self, text: &str) -> (NaiveDate, NaiveDate) {
        let today = self.today();

        if text.contains("next week") {
            let days_until_monday = (7 - today.weekday().num_days_from_monday() as i64) % 7;
            let start = today + Duration::days(if days_until_monday > 0 { days_until_monday } else { 7 });
            return (start, start + Duration::days(4));
        }
        if text.contains("tomorrow") {
            let start = today + Duration::days(1);
            return (start, start + Duration::days(4));
        }

        let mut found = self
            .patterns
            .date
            .captures_iter(text)
            .map(|caps| NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok());

        match found.next().flatten() {
            Some(start) => {
                let end = found
                    .next()
                    .flatten()
                    .filter(|end| *end > start)
                    .unwrap_or(start + Duration::days(5));
                (start, end)
            }
            None => {
                let start = today + Duration::days(7);
                (start, start + Duration::days(5))
            }
        }
    }

    fn places(&self, text: &str) -> (String, String) {
        let p = &self.patterns;

        if let Some(caps) = p.from_to.captures(text) {
            let origin = trim_place(&caps[1]);
            let destination = trim_place(&caps[2]);
            if !origin.is_empty() && !destination.is_empty() {
                return (title_case(&origin), title_case(&destination));
            }
        }

        // "to book a hotel in Paris" 的 "to book" 會被略過
        let destination = p
            .in_to
            .captures_iter(text)
            .map(|caps| trim_place(&caps[1]))
            .find(|place| !place.is_empty())
            .map(|place| title_case(&place))
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());

        (DEFAULT_ORIGIN.to_string(), destination)
    }
}

#[async_trait]
impl Interpreter for KeywordInterpreter {
    async fn interpret(&self, query: &str) -> Result<TripIntent> {
        self.parse(query)
    }
}

fn trim_place(raw: &str) -> String {
    raw.split_whitespace()
        .take_while(|word| !STOP_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut capitalize = true;
    for ch in text.chars() {
        if capitalize && ch.is_alphabetic() {
            result.extend(ch.to_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
            capitalize = !ch.is_alphabetic();
        }
    }
    result
}
