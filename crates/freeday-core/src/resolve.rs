//! Cache decision resolver.
//!
//! Works out which country (and region) a request refers to, and whether the
//! requested year is already cached for either. When the country is not stored
//! yet, the upstream catalogue is fetched once and handed back as a pending
//! sync; the caller reconciles it alongside the day fetch.

use tracing::debug;

use crate::{
  Error, Result,
  calendar::CalendarDate,
  classify::OwnerContext,
  country::{CountryWithRegions, Region},
  reconcile::Reconciler,
  source::{CalendarSource, SourceCountry},
  store::CalendarStore,
};

/// How the request names its country.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CountryKey {
  /// Upstream three-letter code; skips name resolution.
  Code(String),
  /// Full display name, matched case-insensitively.
  Name(String),
}

impl CountryKey {
  /// The request field reported when resolution fails.
  pub fn field(&self) -> &'static str {
    match self {
      Self::Code(_) => "country",
      Self::Name(_) => "country_name",
    }
  }

  pub fn value(&self) -> &str {
    match self {
      Self::Code(v) | Self::Name(v) => v,
    }
  }

  fn matches(&self, c: &SourceCountry) -> bool {
    match self {
      Self::Code(code) => c.code.eq_ignore_ascii_case(code),
      Self::Name(name) => c.full_name.eq_ignore_ascii_case(name),
    }
  }
}

/// What the resolver found for one request.
#[derive(Debug, Clone)]
pub struct Resolution {
  /// The stored country snapshot, or `None` when the country is not stored
  /// yet and `pending_sync` must be reconciled first.
  pub country:            Option<CountryWithRegions>,
  /// Upstream code to use for day fetches.
  pub code:               String,
  /// Upstream region code, if one was requested.
  pub region_code:        Option<String>,
  /// The stored region, when both country and region are stored.
  pub region:             Option<Region>,
  pub valid_from:         CalendarDate,
  pub valid_to:           CalendarDate,
  pub country_year_found: bool,
  pub region_year_found:  bool,
  /// Upstream catalogue to create-or-update before re-reading the country.
  pub pending_sync:       Option<Vec<SourceCountry>>,
}

impl Resolution {
  /// Whether storage alone answers year-level questions.
  pub fn year_cached(&self) -> bool { self.country_year_found || self.region_year_found }

  /// Reject a year the upstream holds no data for.
  pub fn check_year(&self, year: i32) -> Result<()> {
    if (self.valid_from.year..=self.valid_to.year).contains(&year) {
      Ok(())
    } else {
      Err(self.out_of_range(CalendarDate::new(year, 1, 1)))
    }
  }

  /// Reject a date outside the country's supported range.
  pub fn check_date(&self, date: CalendarDate) -> Result<()> {
    if (self.valid_from..=self.valid_to).contains(&date) {
      Ok(())
    } else {
      Err(self.out_of_range(date))
    }
  }

  /// Classification context; only available once the country is stored.
  pub fn owner_context(&self) -> Option<OwnerContext> {
    let country = self.country.as_ref()?;
    Some(OwnerContext {
      country_id:         country.country.country_id,
      workdays:           country.country.workdays,
      country_year_found: self.country_year_found,
      region_year_found:  self.region_year_found,
      region_id:          self.region.as_ref().map(|r| r.region_id),
    })
  }

  fn out_of_range(&self, requested: CalendarDate) -> Error {
    Error::OutOfRange {
      requested,
      from: self.valid_from,
      to: self.valid_to,
    }
  }
}

/// Resolve a request key against storage, falling back to the upstream
/// catalogue when the country is not stored.
pub async fn resolve<S, U>(
  store: &S,
  source: &U,
  key: &CountryKey,
  region: Option<&str>,
  year: i32,
) -> Result<Resolution>
where
  S: CalendarStore,
  U: CalendarSource,
{
  let stored = match key {
    CountryKey::Code(code) => store.find_country_by_code(code).await,
    CountryKey::Name(name) => store.find_country_by_name(name).await,
  }
  .map_err(Error::store)?;

  if let Some(country) = stored {
    return from_stored(country, region, year);
  }

  debug!(key = key.value(), "country not stored, listing upstream catalogue");
  let catalogue = source.list_countries().await.map_err(Error::upstream)?;
  let Some(found) = catalogue.iter().find(|c| key.matches(c)) else {
    let err = Error::NotFound {
      field: key.field(),
      value: key.value().to_owned(),
    };
    return Err(settle_then(store, &catalogue, err).await);
  };

  let region_code = match region {
    Some(code) => match found.regions.iter().find(|r| r.eq_ignore_ascii_case(code)) {
      Some(r) => Some(r.clone()),
      None => return Err(settle_then(store, &catalogue, region_not_found(code)).await),
    },
    None => None,
  };

  Ok(Resolution {
    country: None,
    code: found.code.clone(),
    region_code,
    region: None,
    valid_from: found.valid_from,
    valid_to: found.valid_to,
    country_year_found: false,
    region_year_found: false,
    pending_sync: Some(catalogue.clone()),
  })
}

/// Build a resolution from an already stored country.
pub fn from_stored(
  country: CountryWithRegions,
  region: Option<&str>,
  year: i32,
) -> Result<Resolution> {
  let region = match region {
    Some(code) => Some(
      country
        .region(code)
        .cloned()
        .ok_or_else(|| region_not_found(code))?,
    ),
    None => None,
  };

  let country_year_found = country.country.years.contains(&year);
  let region_year_found = region.as_ref().is_some_and(|r| r.years.contains(&year));
  debug!(
    code = %country.country.code,
    year,
    country_year_found,
    region_year_found,
    "resolved stored country"
  );

  Ok(Resolution {
    code: country.country.code.clone(),
    region_code: region.as_ref().map(|r| r.code.clone()),
    region,
    valid_from: country.country.from_date,
    valid_to: country.country.to_date,
    country_year_found,
    region_year_found,
    pending_sync: None,
    country: Some(country),
  })
}

/// Store a listed catalogue before surfacing `err`, so the next request for
/// the same country resolves locally. A failing sync wins over `err`.
pub(crate) async fn settle_then<S: CalendarStore>(
  store: &S,
  catalogue: &[SourceCountry],
  err: Error,
) -> Error {
  match Reconciler::new(store).sync_countries(catalogue).await {
    Ok(_) => err,
    Err(sync) => sync,
  }
}

fn region_not_found(code: &str) -> Error {
  Error::NotFound { field: "region", value: code.to_owned() }
}
