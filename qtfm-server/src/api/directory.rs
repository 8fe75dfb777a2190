//! Station directory pass-through endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use qtfm_common::directory::Station;
use qtfm_common::{RegionId, RegionObject};

use crate::{ApiError, AppState};

/// GET /regions
///
/// Region list exactly as upstream returned it
pub async fn get_regions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegionObject>>, ApiError> {
    let regions = state.directory.regions().await?;
    Ok(Json(regions))
}

/// GET /radios/:cid
///
/// Stations of one region. `cid` must be numeric; it is interpolated into
/// the upstream query.
pub async fn get_radios(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<Vec<Station>>, ApiError> {
    let region: RegionId = cid.parse()?;
    let stations = state.directory.stations(region).await?;
    Ok(Json(stations))
}
