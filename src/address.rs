//! Phone number to SMS-gateway address resolution.
//!
//! A number is turned into `local-part@domain` by stripping the region's
//! international prefix, removing separators and looking up the carrier's
//! gateway domain. The tables are fixed.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    US,
    UK,
    CA,
    AU,
}

impl Region {
    pub fn all() -> &'static [Region] {
        &[Region::US, Region::UK, Region::CA, Region::AU]
    }

    /// The international dialing prefix stripped from numbers in this region
    pub fn dialing_prefix(self) -> &'static str {
        match self {
            Region::US | Region::CA => "+1",
            Region::UK => "+44",
            Region::AU => "+61",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::US => "United States",
            Region::UK => "United Kingdom",
            Region::CA => "Canada",
            Region::AU => "Australia",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Region {
    type Err = Error;

    /// Accepts either the two-letter code or the full name
    fn from_str(s: &str) -> Result<Region, Error> {
        let s = s.trim();
        Region::all()
            .iter()
            .cloned()
            .find(|r| s.eq_ignore_ascii_case(&format!("{:?}", r)) || s.eq_ignore_ascii_case(r.name()))
            .ok_or_else(|| Error::Validation(format!("Unknown region: {}", s)))
    }
}

// (region, carrier, gateway domain)
const GATEWAYS: &[(Region, &str, &str)] = &[
    (Region::US, "AT&T", "txt.att.net"),
    (Region::US, "T-Mobile", "tmomail.net"),
    (Region::US, "Verizon", "vtext.com"),
    (Region::US, "Sprint", "messaging.sprintpcs.com"),
    (Region::UK, "Vodafone UK", "vodafone.net"),
    (Region::UK, "O2", "o2.co.uk"),
    (Region::CA, "Rogers", "pcs.rogers.com"),
    (Region::CA, "Bell", "txt.bell.ca"),
    (Region::CA, "Telus", "msg.telus.com"),
    (Region::CA, "Fido", "fido.ca"),
    (Region::AU, "Telstra", "sms.telstra.com"),
    (Region::AU, "Optus", "optusmobile.com.au"),
    (Region::AU, "Vodafone AU", "vfa.com.au"),
];

/// Carrier names known for a region, in display order
pub fn carriers(region: Region) -> Vec<&'static str> {
    GATEWAYS
        .iter()
        .filter(|(r, _, _)| *r == region)
        .map(|(_, carrier, _)| *carrier)
        .collect()
}

/// The gateway domain for a region/carrier pair
pub fn gateway_domain(region: Region, carrier: &str) -> Option<&'static str> {
    GATEWAYS
        .iter()
        .find(|(r, c, _)| *r == region && *c == carrier)
        .map(|(_, _, domain)| *domain)
}

/// Resolve a raw phone number to a delivery address.
///
/// Returns `None` if the region/carrier pair is not in the gateway table or
/// nothing is left of the number once separators are removed.
pub fn resolve(raw_number: &str, region: Region, carrier: &str) -> Option<String> {
    let domain = gateway_domain(region, carrier)?;

    let number = raw_number.trim();
    let number = if number.starts_with(region.dialing_prefix()) {
        &number[region.dialing_prefix().len()..]
    } else {
        number
    };

    let local: String = number
        .chars()
        .filter(|c| !matches!(c, '+' | '-' | ' '))
        .collect();

    if local.is_empty() {
        return None;
    }

    Some(format!("{}@{}", local, domain))
}

/// Resolve every line of a recipient list, dropping the ones that do not resolve
pub fn resolve_all<I, S>(numbers: I, region: Region, carrier: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    numbers
        .into_iter()
        .filter_map(|n| {
            let resolved = resolve(n.as_ref(), region, carrier);
            if resolved.is_none() {
                debug!("(address) unresolvable: {:?} ({}, {})", n.as_ref(), region, carrier);
            }
            resolved
        })
        .collect()
}
