//! Handler for `/countries`.

use std::sync::Arc;

use axum::{Json, extract::State};
use freeday_core::{
  HolidayService,
  country::CountryWithRegions,
  source::CalendarSource,
  store::CalendarStore,
};

use crate::error::ApiError;

/// `GET /countries` — every stored country with its regions and cached years.
pub async fn list<S, U>(
  State(service): State<Arc<HolidayService<S, U>>>,
) -> Result<Json<Vec<CountryWithRegions>>, ApiError>
where
  S: CalendarStore + 'static,
  U: CalendarSource + 'static,
{
  Ok(Json(service.countries().await?))
}
