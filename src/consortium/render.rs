//! Rendering of the consortium card message.
//!
//! The card is the single chat message that gets edited on every join to
//! reflect the current roster. The original bot patched the previous message
//! text line by line; here the whole card is generated fresh from the entity
//! on every edit, and [`splice_participant_line`] keeps the legacy line-patch
//! contract around so the renderer can be checked against it.

use super::Consortium;
use chrono::{Datelike, NaiveDate};

/// Escape the characters Telegram's HTML parse mode treats specially.
///
/// Participant names come straight from the Telegram profile and may contain
/// anything.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Format a value as Brazilian currency: `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let negative = value < 0.0;
    // Round half-up at the cent; the stored fee itself is never rounded.
    let total_cents = (value.abs() * 100.0).round() as u64;
    let reais = total_cents / 100;
    let cents = total_cents % 100;

    let digits = reais.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("R$ {sign}{grouped},{cents:02}")
}

/// Format a date the Brazilian way: `dd/mm/aaaa`.
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// The first draw happens on the last calendar day of the month after `today`.
pub fn first_draw_date(today: NaiveDate) -> NaiveDate {
    let (year, month) = match today.month() {
        11 => (today.year() + 1, 1),
        12 => (today.year() + 1, 2),
        m => (today.year(), m + 2),
    };
    // First day of the month after next, minus one day.
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(today)
}

/// Plain-text confirmation summary shown with the Sim/Não buttons.
pub fn summary_text(amount: f64, participants: u32) -> String {
    let monthly_fee = amount / f64::from(participants);
    [
        format!("Valor total: {}", format_brl(amount)),
        format!("Participantes: {participants} participantes"),
        format!("Parcela: {}", format_brl(monthly_fee)),
        format!("Duração: {participants} meses"),
        String::new(),
        "Confirmar início do consórcio?".to_string(),
    ]
    .join("\n")
}

/// Render the public consortium card from the entity.
///
/// `today` only matters once the roster is full: the first-draw date is
/// computed at the moment of the completing join, same as the original
/// message edit did.
pub fn render_card(consortium: &Consortium, today: NaiveDate) -> String {
    let mut lines = vec![
        format!(
            "Consórcio iniciado em <b>{}</b>",
            format_date_br(consortium.created_on)
        ),
        format!("Valor total: <b>{}</b>", format_brl(consortium.amount)),
        format!("Participantes: <b>{}</b>", consortium.participants),
        format!("Parcela: <b>{}</b>", format_brl(consortium.monthly_fee)),
        format!("Duração: <b>{} meses</b>", consortium.participants),
        "Mês atual: <b>1</b>".to_string(),
        String::new(),
        "Let's fucking gooooo 🤑".to_string(),
        String::new(),
        "Lista de participantes:".to_string(),
    ];

    for (i, participant) in consortium.participants_list.iter().enumerate() {
        let name = escape_html(&participant.name);
        if i == 0 {
            // Creator bullet is bold; later joins are plain.
            lines.push(format!("- <b>{name}</b>"));
        } else {
            lines.push(format!("- {name}"));
        }
    }

    lines.push(String::new());
    if consortium.is_complete() {
        lines.push("<i>Lista de participantes preenchida!</i>".to_string());
        lines.push(String::new());
        lines.push(format!(
            "Data do primeiro sorteio: <b>{}</b>",
            format_date_br(first_draw_date(today))
        ));
        lines.push(String::new());
        lines.push("Boa sorte!".to_string());
    } else {
        lines.push("Clique em \"Participar\" para entrar no consórcio.".to_string());
    }

    lines.join("\n")
}

/// Legacy message-patch contract: insert the bullet for a joining participant
/// two lines before the end of the previous card text, i.e. immediately
/// before the trailing blank-line + call-to-action block. All other lines are
/// preserved verbatim.
pub fn splice_participant_line(text: &str, name: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let bullet = format!("- {}", escape_html(name));
    let at = lines.len().saturating_sub(2);
    lines.insert(at, &bullet);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consortium::Participant;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(participants: u32) -> Consortium {
        Consortium::new(
            1200.0,
            participants,
            Participant::new("Ana", 1),
            date(2024, 3, 15),
        )
    }

    // ── Formatting ──────────────────────────────────────────────────

    #[test]
    fn brl_small_value() {
        assert_eq!(format_brl(7.5), "R$ 7,50");
    }

    #[test]
    fn brl_groups_thousands() {
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1_000_000.0), "R$ 1.000.000,00");
    }

    #[test]
    fn brl_rounds_display_only() {
        assert_eq!(format_brl(333.333_333), "R$ 333,33");
        assert_eq!(format_brl(0.005), "R$ 0,01");
    }

    #[test]
    fn brl_negative() {
        assert_eq!(format_brl(-12.3), "R$ -12,30");
    }

    #[test]
    fn date_br_format() {
        assert_eq!(format_date_br(date(2024, 3, 5)), "05/03/2024");
    }

    // ── Draw date ───────────────────────────────────────────────────

    #[test]
    fn draw_date_is_last_day_of_next_month() {
        assert_eq!(first_draw_date(date(2024, 3, 15)), date(2024, 4, 30));
        assert_eq!(first_draw_date(date(2024, 1, 1)), date(2024, 2, 29)); // leap
        assert_eq!(first_draw_date(date(2023, 1, 31)), date(2023, 2, 28));
    }

    #[test]
    fn draw_date_crosses_year_boundary() {
        assert_eq!(first_draw_date(date(2024, 11, 3)), date(2024, 12, 31));
        assert_eq!(first_draw_date(date(2024, 12, 25)), date(2025, 1, 31));
    }

    // ── Escaping ────────────────────────────────────────────────────

    #[test]
    fn escape_html_special_chars() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(escape_html("Ana"), "Ana");
    }

    // ── Summary ─────────────────────────────────────────────────────

    #[test]
    fn summary_lists_all_terms() {
        let text = summary_text(1200.0, 12);
        assert_eq!(
            text,
            "Valor total: R$ 1.200,00\n\
             Participantes: 12 participantes\n\
             Parcela: R$ 100,00\n\
             Duração: 12 meses\n\
             \n\
             Confirmar início do consórcio?"
        );
    }

    // ── Card rendering ──────────────────────────────────────────────

    #[test]
    fn card_with_single_creator() {
        let card = render_card(&sample(3), date(2024, 3, 15));
        let lines: Vec<&str> = card.split('\n').collect();
        assert_eq!(lines[0], "Consórcio iniciado em <b>15/03/2024</b>");
        assert_eq!(lines[9], "Lista de participantes:");
        assert_eq!(lines[10], "- <b>Ana</b>");
        assert_eq!(lines[11], "");
        assert_eq!(
            lines[12],
            "Clique em \"Participar\" para entrar no consórcio."
        );
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn card_keeps_join_button_until_full() {
        let mut c = sample(3);
        c.join(Participant::new("Bia", 2));
        let card = render_card(&c, date(2024, 3, 16));
        assert!(card.contains("- <b>Ana</b>\n- Bia\n"));
        assert!(card.ends_with("Clique em \"Participar\" para entrar no consórcio."));
        assert!(!card.contains("preenchida"));
    }

    #[test]
    fn card_when_full_shows_draw_date_and_drops_cta() {
        let mut c = sample(2);
        c.join(Participant::new("Bia", 2));
        let card = render_card(&c, date(2024, 3, 16));
        assert_eq!(
            card.matches("<i>Lista de participantes preenchida!</i>").count(),
            1
        );
        assert!(card.contains("Data do primeiro sorteio: <b>30/04/2024</b>"));
        assert!(card.ends_with("Boa sorte!"));
        assert!(!card.contains("Clique em"));
    }

    #[test]
    fn card_escapes_participant_names() {
        let mut c = Consortium::new(
            100.0,
            3,
            Participant::new("<Ana>", 1),
            date(2024, 3, 15),
        );
        c.join(Participant::new("B&b", 2));
        let card = render_card(&c, date(2024, 3, 15));
        assert!(card.contains("- <b>&lt;Ana&gt;</b>"));
        assert!(card.contains("- B&amp;b"));
    }

    // ── Legacy splice contract ──────────────────────────────────────

    #[test]
    fn splice_inserts_two_lines_before_the_end() {
        let text = ["A", "B", "", "Lista:", "- X", "", "Clique..."].join("\n");
        let spliced = splice_participant_line(&text, "Y");
        assert_eq!(
            spliced,
            ["A", "B", "", "Lista:", "- X", "- Y", "", "Clique..."].join("\n")
        );
    }

    #[test]
    fn splice_twice_keeps_join_order() {
        let text = ["Lista:", "- X", "", "Clique..."].join("\n");
        let once = splice_participant_line(&text, "Y");
        let twice = splice_participant_line(&once, "Z");
        assert_eq!(twice, ["Lista:", "- X", "- Y", "- Z", "", "Clique..."].join("\n"));
    }

    #[test]
    fn renderer_matches_splice_contract() {
        // Re-rendering after a join must produce exactly what patching the
        // previous card text would have.
        let today = date(2024, 3, 16);
        let mut c = sample(4);
        let mut patched = render_card(&c, today);
        for (name, id) in [("Bia", 2), ("Caio", 3)] {
            patched = splice_participant_line(&patched, name);
            c.join(Participant::new(name, id));
            assert_eq!(render_card(&c, today), patched);
        }
    }
}
