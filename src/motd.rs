//! Message of the day: a fixed pick from a message list that changes once
//! per business day.
//!
//! Messages are `{id, mensagem, referencia}` records in a JSON file. The
//! business days elapsed since January 1st select the message, so every
//! display running on the same day shows the same one, and weekends keep
//! Monday's.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc, Weekday};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// São Paulo, which has stayed on UTC-3 all year since 2019
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMessage {
    pub id: u64,
    #[serde(rename = "mensagem")]
    pub text: String,
    #[serde(rename = "referencia")]
    pub reference: String,
}

/// Shown when the message file is missing or holds nothing usable
#[must_use]
pub fn fallback_messages() -> Vec<DailyMessage> {
    vec![DailyMessage {
        id: 1,
        text: "Tenho-vos dito isto, para que em mim tenhais paz; no mundo tereis aflicoes, \
               mas tende bom animo, eu venci o mundo."
            .to_string(),
        reference: "Joao 16:33".to_string(),
    }]
}

#[derive(Debug, thiserror::Error)]
pub enum MessageFileError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of messages")]
    NotAList,
}

/// Messages from `path`, or the built-in list when the file is unusable
pub fn load_messages(path: &Path) -> Vec<DailyMessage> {
    match fs::read_to_string(path)
        .map_err(MessageFileError::from)
        .and_then(|raw| parse_messages(&raw))
    {
        Ok(messages) if !messages.is_empty() => messages,
        Ok(_) => {
            warn!("No usable messages in {path:?}, using the built-in one");
            fallback_messages()
        }
        Err(e) => {
            warn!("Cannot read messages from {path:?}: {e}");
            fallback_messages()
        }
    }
}

/// Parse a message list, dropping entries without text or reference
pub fn parse_messages(raw: &str) -> Result<Vec<DailyMessage>, MessageFileError> {
    let value: Value = serde_json::from_str(raw.trim_start_matches('\u{feff}'))?;
    let Value::Array(items) = value else {
        return Err(MessageFileError::NotAList);
    };
    let messages: Vec<_> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| sanitize(index, item))
        .collect();
    debug!("Kept {} of {} messages", messages.len(), items.len());
    Ok(messages)
}

fn sanitize(index: usize, item: &Value) -> Option<DailyMessage> {
    let text = field_text(item, "mensagem");
    let reference = field_text(item, "referencia");
    if text.is_empty() || reference.is_empty() {
        return None;
    }
    let id = item
        .get("id")
        .and_then(numeric_id)
        .unwrap_or(index as u64 + 1);
    Some(DailyMessage {
        id,
        text,
        reference,
    })
}

fn numeric_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id != 0).then_some(id)
}

fn field_text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// The pick for one day, with the following business day's pick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageOfDay {
    pub date: NaiveDate,
    /// `date`, or the Monday after it on weekends
    pub business_date: NaiveDate,
    pub week_day: &'static str,
    pub next_business_date: NaiveDate,
    pub next_week_day: &'static str,
    pub message_index: usize,
    pub message: DailyMessage,
    pub next_message: DailyMessage,
    pub total_messages: usize,
}

#[must_use]
pub fn utc_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Calendar date at `now` on a clock `offset` from UTC
#[must_use]
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn business_day_on_or_after(date: NaiveDate) -> NaiveDate {
    let mut day = date;
    while !is_business_day(day) {
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    day
}

fn next_business_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().map_or(date, business_day_on_or_after)
}

/// Business days from January 1st up to and including `date`
fn business_days_into_year(date: NaiveDate) -> usize {
    let Some(start) = NaiveDate::from_ymd_opt(date.year(), 1, 1) else {
        return 0;
    };
    start
        .iter_days()
        .take_while(|day| *day <= date)
        .filter(|day| is_business_day(*day))
        .count()
}

/// Weekday names as the message board prints them
#[must_use]
pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Segunda",
        Weekday::Tue => "Terca",
        Weekday::Wed => "Quarta",
        Weekday::Thu => "Quinta",
        Weekday::Fri => "Sexta",
        Weekday::Sat => "Sabado",
        Weekday::Sun => "Domingo",
    }
}

/// Message for `today`; `None` only for an empty list
#[must_use]
pub fn resolve(messages: &[DailyMessage], today: NaiveDate) -> Option<MessageOfDay> {
    if messages.is_empty() {
        return None;
    }
    let business_date = business_day_on_or_after(today);
    let index = business_days_into_year(business_date).saturating_sub(1) % messages.len();
    let next_business_date = next_business_day(business_date);
    Some(MessageOfDay {
        date: today,
        business_date,
        week_day: weekday_label(business_date),
        next_business_date,
        next_week_day: weekday_label(next_business_date),
        message_index: index,
        message: messages[index].clone(),
        next_message: messages[(index + 1) % messages.len()].clone(),
        total_messages: messages.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn messages(n: u64) -> Vec<DailyMessage> {
        (1..=n)
            .map(|id| DailyMessage {
                id,
                text: format!("Message {id}"),
                reference: format!("Ref {id}"),
            })
            .collect()
    }

    #[test]
    fn first_business_day_of_the_year_picks_the_first_message() {
        let pick = resolve(&messages(3), day(2026, 1, 1)).unwrap();
        assert_eq!(pick.message_index, 0);
        assert_eq!(pick.week_day, "Quinta");
        assert_eq!(pick.next_business_date, day(2026, 1, 2));
        assert_eq!(pick.next_message.id, 2);
        assert_eq!(pick.total_messages, 3);
    }

    #[test]
    fn weekend_shows_mondays_message() {
        let saturday = resolve(&messages(3), day(2026, 1, 3)).unwrap();
        let monday = resolve(&messages(3), day(2026, 1, 5)).unwrap();

        assert_eq!(saturday.date, day(2026, 1, 3));
        assert_eq!(saturday.business_date, day(2026, 1, 5));
        assert_eq!(saturday.week_day, "Segunda");
        // Thu 1st, Fri 2nd, Mon 5th
        assert_eq!(saturday.message_index, 2);
        assert_eq!(saturday.message, monday.message);
        assert_eq!(saturday.next_business_date, day(2026, 1, 6));
        assert_eq!(saturday.next_week_day, "Terca");
        assert_eq!(saturday.next_message.id, 1);
    }

    #[test]
    fn friday_is_followed_by_monday() {
        let pick = resolve(&messages(5), day(2026, 10, 16)).unwrap();
        assert_eq!(pick.week_day, "Sexta");
        assert_eq!(pick.next_business_date, day(2026, 10, 19));
        assert_eq!(pick.next_week_day, "Segunda");
    }

    #[test]
    fn empty_list_has_no_message() {
        assert!(resolve(&[], day(2026, 1, 1)).is_none());
    }

    #[test]
    fn local_date_follows_the_offset() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 2, 0, 0).unwrap();
        let sao_paulo = utc_offset(DEFAULT_UTC_OFFSET_MINUTES).unwrap();
        assert_eq!(local_date(now, sao_paulo), day(2026, 10, 15));
        assert_eq!(local_date(now, utc_offset(0).unwrap()), day(2026, 10, 16));
        assert!(utc_offset(48 * 60).is_none());
    }

    #[test]
    fn entries_are_cleaned_up() {
        let raw = "\u{feff}[
            {\"id\": 7, \"mensagem\": \"  Be kind  \", \"referencia\": \"Ef 4:32\"},
            {\"id\": \"12\", \"mensagem\": \"Rejoice\", \"referencia\": \"Fp 4:4\"},
            {\"id\": 0, \"mensagem\": \"Pray\", \"referencia\": \"1Ts 5:17\"},
            {\"mensagem\": \"\", \"referencia\": \"Sl 1:1\"},
            {\"mensagem\": \"No reference\"},
            \"not an object\"
        ]";
        let parsed = parse_messages(raw).unwrap();
        let ids: Vec<u64> = parsed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![7, 12, 3]);
        assert_eq!(parsed[0].text, "Be kind");
    }

    #[test]
    fn non_list_file_is_rejected() {
        assert!(matches!(
            parse_messages("{\"mensagem\": \"x\"}"),
            Err(MessageFileError::NotAList)
        ));
    }

    #[test]
    fn unusable_files_fall_back_to_the_built_in_message() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            load_messages(&dir.path().join("missing.json")),
            fallback_messages()
        );

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "[{\"mensagem\": \"\"}]").unwrap();
        assert_eq!(load_messages(&empty), fallback_messages());

        let good = dir.path().join("messages.json");
        fs::write(
            &good,
            "[{\"id\": 1, \"mensagem\": \"Be still\", \"referencia\": \"Sl 46:10\"}]",
        )
        .unwrap();
        assert_eq!(load_messages(&good)[0].reference, "Sl 46:10");
    }
}
