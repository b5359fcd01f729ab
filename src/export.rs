use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::{PlayerGameCorsi, TeamGameCorsi, season_of};
use crate::rates::{PlayerSeasonCorsi, aggregate_seasons};

pub struct ExportReport {
    pub player_seasons: usize,
    pub team_games: usize,
}

/// Writes season-level player rates and per-game team Corsi to a workbook.
pub fn export_season_rates(
    path: &Path,
    players: &[PlayerGameCorsi],
    teams: &[TeamGameCorsi],
) -> Result<ExportReport> {
    let seasons = aggregate_seasons(players);

    let mut season_rows = vec![vec![
        "Season".to_string(),
        "Player ID".to_string(),
        "Team ID".to_string(),
        "Games".to_string(),
        "CF".to_string(),
        "CA".to_string(),
        "Corsi".to_string(),
        "CF%".to_string(),
        "TOI (min)".to_string(),
        "Balanced TOI (min)".to_string(),
        "CF60".to_string(),
        "CA60".to_string(),
    ]];
    season_rows.extend(seasons.iter().map(player_season_row));

    let mut team_rows = vec![vec![
        "Season".to_string(),
        "Game ID".to_string(),
        "Team ID".to_string(),
        "CF".to_string(),
        "CA".to_string(),
        "Corsi".to_string(),
        "CF%".to_string(),
    ]];
    team_rows.extend(teams.iter().map(team_game_row));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("PlayerSeasons")?;
        write_rows(sheet, &season_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TeamGames")?;
        write_rows(sheet, &team_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        player_seasons: season_rows.len().saturating_sub(1),
        team_games: team_rows.len().saturating_sub(1),
    })
}

fn player_season_row(s: &PlayerSeasonCorsi) -> Vec<String> {
    let rates = s.rates();
    vec![
        s.season.to_string(),
        s.player_id.to_string(),
        s.team_id.to_string(),
        s.games.to_string(),
        s.corsi_for.to_string(),
        s.corsi_against.to_string(),
        rates.corsi.to_string(),
        format!("{:.1}", rates.cf_percent),
        minutes(s.toi_total_sec),
        minutes(s.toi_balanced_sec),
        opt_rate(rates.cf60),
        opt_rate(rates.ca60),
    ]
}

fn team_game_row(t: &TeamGameCorsi) -> Vec<String> {
    vec![
        season_of(t.game_id).to_string(),
        t.game_id.to_string(),
        t.team_id.to_string(),
        t.corsi_for.to_string(),
        t.corsi_against.to_string(),
        t.corsi().to_string(),
        format!("{:.1}", t.cf_percent()),
    ]
}

fn minutes(secs: u64) -> String {
    format!("{:.1}", secs as f64 / 60.0)
}

fn opt_rate(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
