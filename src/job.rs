use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::content_policy::find_denied_term;
use crate::error::Error;
use crate::message::{Attachment, OutboundMessage};
use crate::relay::RelayIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    Minute,
    Hour,
}

impl RateUnit {
    /// Length of the throttle suspension for this unit
    pub fn period(self, config: &Config) -> Duration {
        match self {
            RateUnit::Minute => Duration::from_millis(config.minute_millis),
            RateUnit::Hour => Duration::from_millis(config.hour_millis),
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RateUnit::Minute => write!(f, "minute"),
            RateUnit::Hour => write!(f, "hour"),
        }
    }
}

impl FromStr for RateUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<RateUnit, Error> {
        match &*s.trim().to_lowercase() {
            "minute" | "per minute" => Ok(RateUnit::Minute),
            "hour" | "per hour" => Ok(RateUnit::Hour),
            other => Err(Error::Validation(format!("Unknown rate unit: {}", other))),
        }
    }
}

/// At most `quantity` attempts per `unit` before a throttle suspension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub quantity: usize,
    pub unit: RateUnit,
}

impl RateLimit {
    pub fn new(quantity: usize, unit: RateUnit) -> RateLimit {
        RateLimit { quantity, unit }
    }

    pub fn per_minute(quantity: usize) -> RateLimit {
        RateLimit::new(quantity, RateUnit::Minute)
    }

    pub fn per_hour(quantity: usize) -> RateLimit {
        RateLimit::new(quantity, RateUnit::Hour)
    }

    /// Parse a user-entered quantity
    pub fn parse(quantity: &str, unit: RateUnit) -> Result<RateLimit, Error> {
        let quantity = quantity
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::Validation("Speed value must be a valid integer".to_owned()))?;
        Ok(RateLimit::new(quantity, unit))
    }
}

/// Everything one run needs: who to send to, what, through which relays, how fast
#[derive(Debug, Clone)]
pub struct DispatchJob {
    /// Delivery order. Duplicates are sent twice.
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
    /// Advance to the next relay identity every `rotation_count` attempts
    pub rotation_count: usize,
    pub rate_limit: RateLimit,
    pub relays: Vec<RelayIdentity>,
}

impl DispatchJob {
    /// Check the job can run. Fails on the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.relays.is_empty() {
            return Err(Error::Validation("Please add relay details before starting".to_owned()));
        }
        if self.rotation_count == 0 {
            return Err(Error::Validation("Rotation count must be at least 1".to_owned()));
        }
        if self.rate_limit.quantity == 0 {
            return Err(Error::Validation("Speed value must be at least 1".to_owned()));
        }
        if let Some(term) = find_denied_term(&self.body) {
            return Err(Error::ContentPolicy(term.to_owned()));
        }
        Ok(())
    }

    pub(crate) fn message_for(&self, recipient: &str, relay: &RelayIdentity) -> OutboundMessage {
        OutboundMessage {
            subject: self.subject.clone(),
            html_body: self.body.clone(),
            attachments: self.attachments.clone(),
            to: recipient.to_owned(),
            from: relay.from_address.clone(),
            from_display_name: relay.display_name.clone(),
        }
    }
}

/// Split a pasted or uploaded list into recipients, one per line
pub fn parse_recipients(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn job() -> DispatchJob {
        DispatchJob {
            recipients: vec!["a@example.com".to_owned()],
            subject: "Hello".to_owned(),
            body: "Meeting moved to 3pm".to_owned(),
            attachments: Vec::new(),
            rotation_count: 1,
            rate_limit: RateLimit::per_hour(100),
            relays: vec![RelayIdentity {
                host: "smtp.example.com".to_owned(),
                port: 587,
                username: "ops".to_owned(),
                secret: "s3cret".to_owned(),
                from_address: "ops@example.com".to_owned(),
                display_name: "Ops".to_owned(),
            }],
        }
    }

    #[test]
    fn test_valid_job() {
        assert!(job().validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut j = job();
        j.relays.clear();
        assert!(matches!(j.validate(), Err(Error::Validation(_))));

        let mut j = job();
        j.rotation_count = 0;
        assert!(matches!(j.validate(), Err(Error::Validation(_))));

        let mut j = job();
        j.rate_limit.quantity = 0;
        assert!(matches!(j.validate(), Err(Error::Validation(_))));

        let mut j = job();
        j.body = "You are a WINNER, claim your FREE prize".to_owned();
        assert!(matches!(j.validate(), Err(Error::ContentPolicy(_))));
    }

    #[test]
    fn test_rate_parsing() {
        assert_eq!(RateLimit::parse(" 2000 ", RateUnit::Hour).unwrap(), RateLimit::per_hour(2000));
        assert!(matches!(RateLimit::parse("fast", RateUnit::Minute), Err(Error::Validation(_))));
        assert!(matches!(RateLimit::parse("-3", RateUnit::Minute), Err(Error::Validation(_))));
        assert_eq!("Hour".parse::<RateUnit>().unwrap(), RateUnit::Hour);
        assert!("fortnight".parse::<RateUnit>().is_err());
    }

    #[test]
    fn test_unit_periods() {
        let config = Config::default();
        assert_eq!(RateUnit::Minute.period(&config), Duration::from_secs(60));
        assert_eq!(RateUnit::Hour.period(&config), Duration::from_secs(3600));
    }

    #[test]
    fn test_messages_share_attachment_bytes() {
        let mut j = job();
        j.attachments.push(Attachment::new("agenda.pdf", vec![7u8; 4096]));

        let first = j.message_for("a@example.com", &j.relays[0]);
        let second = j.message_for("b@example.com", &j.relays[0]);
        assert!(Arc::ptr_eq(&first.attachments[0].data, &j.attachments[0].data));
        assert!(Arc::ptr_eq(&first.attachments[0].data, &second.attachments[0].data));
        assert_eq!(second.to, "b@example.com");
    }

    #[test]
    fn test_parse_recipients() {
        let text = "a@example.com\r\n\n  b@example.com  \na@example.com\n";
        assert_eq!(
            parse_recipients(text),
            vec!["a@example.com", "b@example.com", "a@example.com"]
        );
    }
}
