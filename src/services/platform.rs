use crate::{
    config::platform::PlatformConfig,
    error::{AppError, AppResult},
    models::user::PlatformUsernames,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Client for the external coding-platform APIs. One shared reqwest client
/// with a bounded timeout; a hung upstream is cut, not retried.
#[derive(Clone)]
pub struct PlatformService {
    client: reqwest::Client,
    config: PlatformConfig,
}

#[derive(Debug, Deserialize)]
struct LeetCodeApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default, rename = "totalSolved")]
    total_solved: i64,
    #[serde(default, rename = "totalQuestions")]
    total_questions: i64,
    #[serde(default, rename = "easySolved")]
    easy_solved: i64,
    #[serde(default, rename = "mediumSolved")]
    medium_solved: i64,
    #[serde(default, rename = "hardSolved")]
    hard_solved: i64,
    #[serde(default, rename = "acceptanceRate")]
    acceptance_rate: f64,
    #[serde(default)]
    ranking: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeetCodeStats {
    pub username: String,
    pub total_solved: i64,
    pub total_questions: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub acceptance_rate: f64,
    pub ranking: i64,
}

/// Difficulty breakdown shape served by the public passthrough endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeetCodeSolvedBreakdown {
    #[serde(rename = "Easy")]
    pub easy: i64,
    #[serde(rename = "Medium")]
    pub medium: i64,
    #[serde(rename = "Hard")]
    pub hard: i64,
}

#[derive(Debug, Deserialize)]
struct CodeforcesApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    result: Vec<CodeforcesUser>,
}

#[derive(Debug, Deserialize)]
struct CodeforcesUser {
    #[serde(default)]
    handle: String,
    #[serde(default, rename = "firstName")]
    first_name: Option<String>,
    #[serde(default, rename = "lastName")]
    last_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    rating: i64,
    #[serde(default, rename = "maxRating")]
    max_rating: i64,
    #[serde(default)]
    rank: Option<String>,
    #[serde(default, rename = "maxRank")]
    max_rank: Option<String>,
    #[serde(default)]
    contribution: i64,
    #[serde(default, rename = "friendOfCount")]
    friend_of_count: i64,
    #[serde(default)]
    avatar: String,
    #[serde(default, rename = "titlePhoto")]
    title_photo: String,
    #[serde(default, rename = "registrationTimeSeconds")]
    registration_time_seconds: i64,
    #[serde(default, rename = "lastOnlineTimeSeconds")]
    last_online_time_seconds: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeforcesProfile {
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub rating: i64,
    pub max_rating: i64,
    pub rank: String,
    pub max_rank: String,
    pub contribution: i64,
    pub friend_of_count: i64,
    pub avatar: String,
    pub title_photo: String,
    /// Epoch milliseconds
    pub registered_at: i64,
    /// Epoch milliseconds
    pub last_online: i64,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    #[serde(default)]
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    public_repos: i64,
    #[serde(default)]
    followers: i64,
    #[serde(default)]
    following: i64,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    #[serde(default)]
    stargazers_count: i64,
    #[serde(default)]
    forks_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitHubStats {
    pub username: String,
    pub name: Option<String>,
    pub public_repos: i64,
    pub followers: i64,
    pub following: i64,
    pub total_stars: i64,
    pub total_forks: i64,
    pub avatar_url: String,
}

impl PlatformService {
    pub fn from_env() -> Self {
        Self::from_config(PlatformConfig::from_env())
    }

    pub fn from_config(config: PlatformConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("dsatrack")
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    pub async fn leetcode_stats(&self, username: &str) -> AppResult<LeetCodeStats> {
        let url = format!("{}/{}", self.config.leetcode_base, username);
        let body: LeetCodeApiResponse = self.get_json(&url).await?;

        if body.status != "success" {
            tracing::debug!("LeetCode lookup failed for {username}: {}", body.message);
            return Err(AppError::NotFound);
        }

        Ok(LeetCodeStats {
            username: username.to_string(),
            total_solved: body.total_solved,
            total_questions: body.total_questions,
            easy_solved: body.easy_solved,
            medium_solved: body.medium_solved,
            hard_solved: body.hard_solved,
            acceptance_rate: body.acceptance_rate,
            ranking: body.ranking,
        })
    }

    /// Solved-per-difficulty counts for the public passthrough endpoint.
    pub async fn leetcode_solved(&self, username: &str) -> AppResult<LeetCodeSolvedBreakdown> {
        let stats = self.leetcode_stats(username).await?;
        Ok(LeetCodeSolvedBreakdown {
            easy: stats.easy_solved,
            medium: stats.medium_solved,
            hard: stats.hard_solved,
        })
    }

    pub async fn codeforces_profile(&self, handle: &str) -> AppResult<CodeforcesProfile> {
        let url = format!("{}/user.info?handles={}", self.config.codeforces_base, handle);
        let body: CodeforcesApiResponse = self.get_json(&url).await?;

        if body.status != "OK" {
            tracing::debug!("Codeforces lookup failed for {handle}: {}", body.comment);
            return Err(AppError::NotFound);
        }
        let user = body.result.into_iter().next().ok_or(AppError::NotFound)?;

        Ok(CodeforcesProfile {
            handle: user.handle,
            first_name: user.first_name,
            last_name: user.last_name,
            country: user.country,
            city: user.city,
            organization: user.organization,
            rating: user.rating,
            max_rating: user.max_rating,
            rank: user.rank.unwrap_or_else(|| "unrated".to_string()),
            max_rank: user.max_rank.unwrap_or_else(|| "unrated".to_string()),
            contribution: user.contribution,
            friend_of_count: user.friend_of_count,
            avatar: user.avatar,
            title_photo: user.title_photo,
            registered_at: user.registration_time_seconds * 1000,
            last_online: user.last_online_time_seconds * 1000,
        })
    }

    pub async fn github_stats(&self, username: &str) -> AppResult<GitHubStats> {
        let user_url = format!("{}/users/{}", self.config.github_base, username);
        let repos_url = format!(
            "{}/users/{}/repos?per_page=100",
            self.config.github_base, username
        );

        let (user, repos): (GitHubUser, Vec<GitHubRepo>) = tokio::try_join!(
            self.get_json::<GitHubUser>(&user_url),
            self.get_json::<Vec<GitHubRepo>>(&repos_url),
        )?;

        let total_stars = repos.iter().map(|r| r.stargazers_count).sum();
        let total_forks = repos.iter().map(|r| r.forks_count).sum();

        Ok(GitHubStats {
            username: user.login,
            name: user.name,
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            total_stars,
            total_forks,
            avatar_url: user.avatar_url,
        })
    }

    /// Check that a handle exists on the given platform. Used when handles
    /// are first submitted; the platform name is assumed pre-validated.
    pub async fn validate_username(&self, platform: &str, username: &str) -> AppResult<()> {
        match platform {
            "leetcode" => self.leetcode_stats(username).await.map(|_| ()),
            "codeforces" => self.codeforces_profile(username).await.map(|_| ()),
            "github" => self.github_stats(username).await.map(|_| ()),
            other => Err(AppError::Validation(format!(
                "Unknown platform key: {other}"
            ))),
        }
        .map_err(|e| match e {
            AppError::NotFound => AppError::Validation(format!(
                "Invalid {platform} username: {username}"
            )),
            other => other,
        })
    }

    /// Fetch stats for every linked handle. Platforms fail independently;
    /// one upstream being down turns into an `error` entry for that
    /// platform, never a failed response.
    pub async fn aggregate(&self, usernames: &PlatformUsernames) -> serde_json::Value {
        let mut out = serde_json::Map::new();

        if let Some(username) = &usernames.leetcode {
            let entry = match self.leetcode_stats(username).await {
                Ok(stats) => serde_json::to_value(stats)
                    .unwrap_or_else(|_| error_entry("LeetCode stats unavailable")),
                Err(e) => error_entry(&platform_error_message("LeetCode", username, &e)),
            };
            out.insert("leetcode".to_string(), entry);
        }

        if let Some(handle) = &usernames.codeforces {
            let entry = match self.codeforces_profile(handle).await {
                Ok(profile) => serde_json::to_value(profile)
                    .unwrap_or_else(|_| error_entry("Codeforces stats unavailable")),
                Err(e) => error_entry(&platform_error_message("Codeforces", handle, &e)),
            };
            out.insert("codeforces".to_string(), entry);
        }

        if let Some(username) = &usernames.github {
            let entry = match self.github_stats(username).await {
                Ok(stats) => serde_json::to_value(stats)
                    .unwrap_or_else(|_| error_entry("GitHub stats unavailable")),
                Err(e) => error_entry(&platform_error_message("GitHub", username, &e)),
            };
            out.insert("github".to_string(), entry);
        }

        serde_json::Value::Object(out)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Upstream returned {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }
}

fn platform_error_message(platform: &str, username: &str, err: &AppError) -> String {
    match err {
        AppError::NotFound => format!("User {username} not found on {platform}"),
        _ => format!("Failed to fetch {platform} stats"),
    }
}

fn error_entry(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}
