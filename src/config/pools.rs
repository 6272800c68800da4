use crate::data::pool::PoolURL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub url: PoolURL,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolGroup {
    pub name: String,
    pub quota: u32,
    pub pools: Vec<Pool>,
}
