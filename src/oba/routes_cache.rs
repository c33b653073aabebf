use std::{collections::HashMap, sync::Arc};

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{Agency, ObaClient, Route};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWithAgency {
    #[serde(flatten)]
    pub route: Route,
    pub agency_info: Option<Agency>,
}

/// Every route of every agency with coverage, fetched once and shared.
/// A failed load leaves the cache empty so the next `preload` retries.
#[derive(Debug, Clone, Default)]
pub struct RoutesCache {
    routes: Arc<Mutex<Option<Arc<[RouteWithAgency]>>>>,
}

impl RoutesCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn preload(&self, client: &ObaClient) -> Option<Arc<[RouteWithAgency]>> {
        let mut routes = self.routes.lock().await;
        if routes.is_none() {
            match fetch_routes(client).await {
                Ok(fetched) => {
                    info!("Cached {} routes", fetched.len());
                    *routes = Some(fetched.into());
                }
                Err(err) => error!("Error fetching routes: {err}"),
            }
        }
        routes.clone()
    }

    pub async fn get(&self) -> Option<Arc<[RouteWithAgency]>> {
        self.routes.lock().await.clone()
    }
}

async fn fetch_routes(client: &ObaClient) -> Result<Vec<RouteWithAgency>, super::Error> {
    let agencies = client.agencies_with_coverage().await?.list;
    let per_agency = agencies.iter().map(|agency| async move {
        let data = client.routes_for_agency(&agency.agency_id).await?;
        let agency_lookup: HashMap<&str, &Agency> = data
            .references
            .agencies
            .iter()
            .map(|agency| (agency.id.as_str(), agency))
            .collect();
        let routes: Vec<RouteWithAgency> = data
            .list
            .iter()
            .map(|route| RouteWithAgency {
                agency_info: agency_lookup.get(route.agency_id.as_str()).map(|a| (*a).clone()),
                route: route.clone(),
            })
            .collect();
        Ok::<_, super::Error>(routes)
    });
    let routes = try_join_all(per_agency).await?;
    Ok(routes.into_iter().flatten().collect())
}
