//! The bot's rich menu: a 3x2 grid of shortcuts pinned under the chat,
//! with a generated background picture.

mod draw;
mod png;

use crate::line::LineApi;
use draw::{Canvas, Icon, Rgb};
use serde::Serialize;

pub const WIDTH: u32 = 2500;
pub const HEIGHT: u32 = 1686;

const MENU_NAME: &str = "RenovateTrack Menu";
const CHAT_BAR_TEXT: &str = "📋 เมนู";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RichMenu {
    pub size: Size,
    pub selected: bool,
    pub name: String,
    pub chat_bar_text: String,
    pub areas: Vec<Area>,
}

#[derive(Debug, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct Area {
    pub bounds: Bounds,
    pub action: Action,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    Message { text: String },
    Uri { uri: String },
}

/// One grid cell, left to right then top to bottom
struct Button {
    label: &'static str,
    icon: Icon,
    color: Rgb,
}

const BUTTONS: [Button; 6] = [
    Button { label: "ช่วยเหลือ", icon: Icon::Question, color: [96, 165, 250] },
    Button { label: "สรุปยอด", icon: Icon::Bars, color: [248, 113, 113] },
    Button { label: "ทรัพย์สิน", icon: Icon::Home, color: [192, 132, 252] },
    Button { label: "รายจ่าย", icon: Icon::Minus, color: [251, 146, 60] },
    Button { label: "รายรับ", icon: Icon::Plus, color: [74, 222, 128] },
    Button { label: "เว็บไซต์", icon: Icon::Globe, color: [45, 212, 191] },
];

/// The middle column is one pixel wider so the three add up to [WIDTH].
fn cell_bounds(index: usize) -> Bounds {
    const COLUMNS: [(u32, u32); 3] = [(0, 833), (833, 834), (1667, 833)];
    let (x, width) = COLUMNS[index % 3];
    let height = HEIGHT / 2;
    Bounds {
        x,
        y: (index / 3) as u32 * height,
        width,
        height,
    }
}

pub fn menu(dashboard_url: &str) -> RichMenu {
    let message = |text: &str| Action::Message { text: text.into() };
    // the trailing spaces leave the cursor ready for an amount
    let actions = [
        message("ช่วยเหลือ"),
        message("สรุป"),
        message("ทรัพย์สิน"),
        message("จ่าย "),
        message("รับ "),
        Action::Uri {
            uri: dashboard_url.into(),
        },
    ];

    RichMenu {
        size: Size {
            width: WIDTH,
            height: HEIGHT,
        },
        selected: true,
        name: MENU_NAME.into(),
        chat_bar_text: CHAT_BAR_TEXT.into(),
        areas: actions
            .into_iter()
            .enumerate()
            .map(|(i, action)| Area {
                bounds: cell_bounds(i),
                action,
            })
            .collect(),
    }
}

/// Render the menu background as PNG bytes.
pub fn render_image() -> anyhow::Result<Vec<u8>> {
    let (width, height) = (WIDTH as usize, HEIGHT as usize);
    let mut canvas = Canvas::new(width, height);
    canvas.diagonal_gradient([30, 41, 59], [15, 23, 42]);

    for (i, button) in BUTTONS.iter().enumerate() {
        let b = cell_bounds(i);
        let (x, y, w, h) = (b.x as f64, b.y as f64, b.width as f64, b.height as f64);
        canvas.fill_rounded_rect(
            x + 20.0,
            y + 20.0,
            w - 40.0,
            h - 40.0,
            40.0,
            [255, 255, 255],
            0.05,
        );
        let (cx, cy) = (x + w / 2.0, y + h / 2.0);
        canvas.draw_icon(button.icon, cx, cy - 40.0, button.color);
        canvas.draw_text(cx, cy + 120.0, button.label, [220, 220, 220]);
    }

    png::encode_png(width, height, &canvas.pixels)
}

/// Which step of [setup] failed, plus whatever LINE said about it.
#[derive(Debug)]
pub struct SetupError {
    pub error: &'static str,
    pub details: String,
    /// Set once the menu exists on LINE's side
    pub rich_menu_id: Option<String>,
}

/// Create the menu, upload its picture, and make it the default for every
/// user. Returns the new rich menu id.
pub async fn setup(line: &dyn LineApi, dashboard_url: &str) -> Result<String, SetupError> {
    let rich_menu_id = line
        .create_rich_menu(&menu(dashboard_url))
        .await
        .map_err(|e| SetupError {
            error: "Failed to create rich menu",
            details: format!("{e:#}"),
            rich_menu_id: None,
        })?;
    tracing::info!(%rich_menu_id, "created rich menu");

    let fail = |error: &'static str, e: anyhow::Error| SetupError {
        error,
        details: format!("{e:#}"),
        rich_menu_id: Some(rich_menu_id.clone()),
    };

    let image = tokio::task::spawn_blocking(render_image)
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r)
        .map_err(|e| fail("Failed to render rich menu image", e))?;
    line.upload_rich_menu_image(&rich_menu_id, image)
        .await
        .map_err(|e| fail("Failed to upload rich menu image", e))?;
    line.set_default_rich_menu(&rich_menu_id)
        .await
        .map_err(|e| fail("Failed to set default rich menu", e))?;

    Ok(rich_menu_id)
}
