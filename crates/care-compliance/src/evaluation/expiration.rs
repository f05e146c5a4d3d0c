use super::domain::{Credential, CredentialStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_EXPIRING_WINDOW_DAYS: u32 = 30;

/// Whole days from `today` until `expiration`; negative once it has passed.
pub fn days_until(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days()
}

/// Lifecycle rule for dated credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    expiring_window_days: u32,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRING_WINDOW_DAYS)
    }
}

impl ExpirationPolicy {
    pub fn new(expiring_window_days: u32) -> Self {
        Self {
            expiring_window_days,
        }
    }

    pub fn expiring_window_days(&self) -> u32 {
        self.expiring_window_days
    }

    /// Expired before `today`, expiring within the window (inclusive at both
    /// ends), otherwise current.
    pub fn classify(&self, expiration: Option<NaiveDate>, today: NaiveDate) -> CredentialStatus {
        let Some(expiration) = expiration else {
            return CredentialStatus::NoExpiration;
        };

        let days = days_until(expiration, today);
        if days < 0 {
            CredentialStatus::Expired
        } else if days <= i64::from(self.expiring_window_days) {
            CredentialStatus::Expiring
        } else {
            CredentialStatus::Current
        }
    }

    /// Drops the time of day from `now` so a check run at 23:59 agrees with one
    /// run at 00:01.
    pub fn classify_at(&self, expiration: Option<NaiveDate>, now: NaiveDateTime) -> CredentialStatus {
        self.classify(expiration, now.date())
    }

    pub fn classify_credential(&self, credential: &Credential, today: NaiveDate) -> CredentialStatus {
        self.classify(credential.expiration_date, today)
    }

    pub fn tally<'a, I>(&self, credentials: I, today: NaiveDate) -> CredentialTally
    where
        I: IntoIterator<Item = &'a Credential>,
    {
        credentials
            .into_iter()
            .fold(CredentialTally::default(), |mut tally, credential| {
                tally.record(self.classify_credential(credential, today));
                tally
            })
    }

    pub fn tally_by_holder<'a, I>(
        &self,
        credentials: I,
        today: NaiveDate,
    ) -> BTreeMap<String, CredentialTally>
    where
        I: IntoIterator<Item = &'a Credential>,
    {
        let mut by_holder: BTreeMap<String, CredentialTally> = BTreeMap::new();
        for credential in credentials {
            by_holder
                .entry(credential.holder_id.clone())
                .or_default()
                .record(self.classify_credential(credential, today));
        }
        by_holder
    }
}

/// [`ExpirationPolicy::classify`] with the default 30-day window.
pub fn classify_expiration(expiration: Option<NaiveDate>, today: NaiveDate) -> CredentialStatus {
    ExpirationPolicy::default().classify(expiration, today)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTally {
    pub total: usize,
    pub current: usize,
    pub expiring: usize,
    pub expired: usize,
    pub no_expiration: usize,
}

impl CredentialTally {
    pub fn record(&mut self, status: CredentialStatus) {
        self.total += 1;
        match status {
            CredentialStatus::Current => self.current += 1,
            CredentialStatus::Expiring => self.expiring += 1,
            CredentialStatus::Expired => self.expired += 1,
            CredentialStatus::NoExpiration => self.no_expiration += 1,
        }
    }

    pub fn count(&self, status: CredentialStatus) -> usize {
        match status {
            CredentialStatus::Current => self.current,
            CredentialStatus::Expiring => self.expiring,
            CredentialStatus::Expired => self.expired,
            CredentialStatus::NoExpiration => self.no_expiration,
        }
    }

    pub fn merge(&self, other: &CredentialTally) -> CredentialTally {
        CredentialTally {
            total: self.total + other.total,
            current: self.current + other.current,
            expiring: self.expiring + other.expiring,
            expired: self.expired + other.expired,
            no_expiration: self.no_expiration + other.no_expiration,
        }
    }
}

/// Dashboard row for a credential coming due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringCredential {
    pub credential_id: Option<String>,
    pub holder_id: String,
    pub credential_type: String,
    pub expiration_date: NaiveDate,
    pub days_remaining: i64,
}

/// Credentials expiring between `today` and `today + days_ahead`, soonest
/// first. Already-expired and undated credentials are excluded.
pub fn expiring_within<'a, I>(
    credentials: I,
    today: NaiveDate,
    days_ahead: u32,
) -> Vec<ExpiringCredential>
where
    I: IntoIterator<Item = &'a Credential>,
{
    let mut upcoming: Vec<ExpiringCredential> = credentials
        .into_iter()
        .filter_map(|credential| {
            let expiration = credential.expiration_date?;
            let days_remaining = days_until(expiration, today);
            (0..=i64::from(days_ahead))
                .contains(&days_remaining)
                .then(|| ExpiringCredential {
                    credential_id: credential.id.clone(),
                    holder_id: credential.holder_id.clone(),
                    credential_type: credential.credential_type.clone(),
                    expiration_date: expiration,
                    days_remaining,
                })
        })
        .collect();

    upcoming.sort_by(|a, b| {
        a.expiration_date
            .cmp(&b.expiration_date)
            .then_with(|| a.holder_id.cmp(&b.holder_id))
            .then_with(|| a.credential_type.cmp(&b.credential_type))
    });
    upcoming
}
