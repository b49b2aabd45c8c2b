use crate::error::RouteError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            input: InputConfig::default(),
        }
    }
}

/// Diagonal trace policy. `Always` still refuses to cut a corner between two
/// keep-out cells; `IfAtMostOneObstacle` additionally counts other nets'
/// traces as corner obstacles.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagonalMovement {
    Never,
    Always,
    IfAtMostOneObstacle,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    /// Grid cell size in board units (mm).
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: f64,
    /// Extra inflation applied to every keep-out outline.
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_diagonal_movement")]
    pub diagonal_movement: DiagonalMovement,
    /// Same-net sockets closer than this are grouped for routing order.
    #[serde(default = "default_clustering_radius")]
    pub clustering_radius: f64,
    /// Cost of a layer transition, in multiples of a straight step.
    #[serde(default = "default_via_penalty")]
    pub via_penalty: f64,
    /// Clearance square reserved around every socket pad.
    #[serde(default = "default_socket_clearance")]
    pub socket_clearance: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            grid_resolution: default_grid_resolution(),
            margin: default_margin(),
            diagonal_movement: default_diagonal_movement(),
            clustering_radius: default_clustering_radius(),
            via_penalty: default_via_penalty(),
            socket_clearance: default_socket_clearance(),
        }
    }
}

impl RouterConfig {
    /// Eager validation, run before any session state is built.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.grid_resolution.is_finite() || self.grid_resolution <= 0.0 {
            return Err(RouteError::Configuration(format!(
                "grid_resolution must be positive, got {}",
                self.grid_resolution
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(RouteError::Configuration(format!(
                "margin must be non-negative, got {}",
                self.margin
            )));
        }
        if !self.clustering_radius.is_finite() || self.clustering_radius < 0.0 {
            return Err(RouteError::Configuration(format!(
                "clustering_radius must be non-negative, got {}",
                self.clustering_radius
            )));
        }
        if !self.via_penalty.is_finite() || self.via_penalty <= 1.0 {
            return Err(RouteError::Configuration(format!(
                "via_penalty must exceed a lateral step cost of 1.0, got {}",
                self.via_penalty
            )));
        }
        if !self.socket_clearance.is_finite() || self.socket_clearance < 0.0 {
            return Err(RouteError::Configuration(format!(
                "socket_clearance must be non-negative, got {}",
                self.socket_clearance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_board_file")]
    pub board_file: String,
    #[serde(default = "default_output_json")]
    pub output_json: String,
    #[serde(default = "default_output_image")]
    pub output_image: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            board_file: default_board_file(),
            output_json: default_output_json(),
            output_image: default_output_image(),
        }
    }
}

fn default_grid_resolution() -> f64 {
    0.1
}

fn default_margin() -> f64 {
    0.2
}

fn default_diagonal_movement() -> DiagonalMovement {
    DiagonalMovement::Never
}

fn default_clustering_radius() -> f64 {
    5.0
}

fn default_via_penalty() -> f64 {
    10.0
}

fn default_socket_clearance() -> f64 {
    0.5
}

fn default_board_file() -> String {
    "inputs/board.json".to_string()
}

fn default_output_json() -> String {
    "output/routes.json".to_string()
}

fn default_output_image() -> String {
    "output/routed.png".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RouterConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_resolution_and_margin() {
        let mut cfg = RouterConfig::default();
        cfg.grid_resolution = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RouterConfig::default();
        cfg.margin = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_cheap_vias() {
        let mut cfg = RouterConfig::default();
        cfg.via_penalty = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_toml_with_partial_fields() {
        let cfg: Config = toml::from_str(
            r#"
            [router]
            grid_resolution = 0.25
            diagonal_movement = "if_at_most_one_obstacle"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.router.grid_resolution, 0.25);
        assert_eq!(
            cfg.router.diagonal_movement,
            DiagonalMovement::IfAtMostOneObstacle
        );
        assert_eq!(cfg.router.via_penalty, 10.0);
    }
}
