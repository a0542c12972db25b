use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::AppData;

pub const ANONYMOUS_VIEWER: &str = "游客";
const USER_STATS_LIMIT: usize = 20;
const RECENT_FAVORITES_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub success: bool,
    pub total_users: usize,
    pub total_watches: u64,
    pub total_favorites: usize,
    pub category_stats: Vec<CategoryStat>,
    pub user_stats: Vec<UserStat>,
    pub recent_favorites: Vec<RecentFavorite>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CategoryStat {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserStat {
    pub username: String,
    pub watch_count: usize,
}

#[derive(Debug, Serialize)]
pub struct RecentFavorite {
    pub username: String,
    pub video_url: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn build_admin_stats(data: &AppData) -> AdminStats {
    let mut recent_favorites: Vec<RecentFavorite> = data
        .favorites
        .iter()
        .flat_map(|(username, favorites)| {
            favorites.iter().map(move |favorite| RecentFavorite {
                username: username.clone(),
                video_url: favorite.video_url.clone(),
                category: favorite.category.clone(),
                created_at: favorite.created_at,
            })
        })
        .collect();
    let total_favorites = recent_favorites.len();
    recent_favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_favorites.truncate(RECENT_FAVORITES_LIMIT);

    let mut category_stats: Vec<CategoryStat> = data
        .stats
        .category_watches
        .iter()
        .map(|(category, count)| CategoryStat {
            category: category.clone(),
            count: *count,
        })
        .collect();
    category_stats.sort_by(|a, b| b.count.cmp(&a.count));

    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for event in &data.watch_history {
        let username = event
            .username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_VIEWER);
        *per_user.entry(username).or_insert(0) += 1;
    }
    let mut user_stats: Vec<UserStat> = per_user
        .into_iter()
        .map(|(username, watch_count)| UserStat {
            username: username.to_string(),
            watch_count,
        })
        .collect();
    user_stats.sort_by(|a, b| {
        b.watch_count
            .cmp(&a.watch_count)
            .then_with(|| a.username.cmp(&b.username))
    });
    user_stats.truncate(USER_STATS_LIMIT);

    AdminStats {
        success: true,
        total_users: data.users.len(),
        total_watches: data.stats.total_watches,
        total_favorites,
        category_stats,
        user_stats,
        recent_favorites,
    }
}
