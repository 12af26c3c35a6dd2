use fgmod_steam::{common_root, list_installed_games};
use tracing::{error, info};

use crate::config::FgmodConfig;
use crate::response::Response;

pub fn list_games(cfg: &FgmodConfig) -> Response {
    match list_installed_games(&cfg.steam_root) {
        Ok(games) => {
            info!(count = games.len(), steam_root = %cfg.steam_root, "listed installed games");
            Response {
                games: Some(games),
                ..Response::success()
            }
        }
        Err(err) => {
            error!(error = %err, steam_root = %cfg.steam_root, "game listing failed");
            Response::error(err.to_string())
        }
    }
}

pub fn path_defaults(cfg: &FgmodConfig) -> Response {
    Response {
        home: Some(cfg.home.to_string()),
        common_root: Some(common_root(&cfg.home).to_string()),
        ..Response::default()
    }
}
