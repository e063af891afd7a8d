//! Server-rendered console page.

use crate::session::ConsoleView;
use cryptodevs_types::ConsoleAction;

const TITLE: &str = "Crypto Devs NFT";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn action_route(action: ConsoleAction) -> &'static str {
    match action {
        ConsoleAction::Connect => "/connect",
        ConsoleAction::StartPresale => "/presale/start",
        ConsoleAction::PresaleMint => "/mint/presale",
        ConsoleAction::PublicMint => "/mint/public",
    }
}

fn body(view: &ConsoleView) -> String {
    let mut html = String::new();
    if let Some(message) = view.phase.message() {
        html.push_str(&format!(r#"<span class="description">{}</span>"#, escape(message)));
    }
    if let Some(action) = view.phase.action() {
        html.push_str(&format!(
            r#"<form method="post" action="{}"><button class="button" type="submit">{}</button></form>"#,
            action_route(action),
            escape(action.label())
        ));
    }
    html
}

/// Render the full page. `refresh_secs` drives the meta refresh.
pub fn page(view: &ConsoleView, refresh_secs: u64, hero_image: &str) -> String {
    let mut banners = String::new();
    if let Some(warning) = &view.network_warning {
        banners.push_str(&format!(r#"<div class="warning">{}</div>"#, escape(warning)));
    }
    if let Some(notice) = &view.notice {
        banners.push_str(&format!(r#"<div class="notice">{}</div>"#, escape(notice)));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh_secs}">
<title>{title}</title>
</head>
<body>
<div class="main">
<div>
<h1 class="title">Welcome to Crypto Devs!</h1>
<div class="description">It&#39;s an NFT collection for developers in Crypto.</div>
<div class="description">{minted}/{max_supply} have been minted</div>
{banners}
<div class="phase" data-phase="{phase}">{body}</div>
</div>
<div><img class="image" src="{image}" alt="Crypto Dev"></div>
</div>
</body>
</html>
"#,
        minted = escape(&view.minted),
        max_supply = view.max_supply,
        phase = phase_tag(view),
        body = body(view),
        title = TITLE,
        image = escape(hero_image),
    )
}

fn phase_tag(view: &ConsoleView) -> String {
    serde_json::to_value(view.phase)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptodevs_types::{ConsoleFlags, Phase};

    fn view_with(flags: ConsoleFlags) -> ConsoleView {
        ConsoleView {
            phase: Phase::select(&flags),
            flags,
            minted: "3".into(),
            max_supply: 20,
            account: None,
            network_warning: None,
            notice: None,
        }
    }

    #[test]
    fn test_disconnected_offers_connect() {
        let html = page(&view_with(ConsoleFlags::default()), 5, "/0.svg");
        assert!(html.contains(r#"action="/connect""#));
        assert!(html.contains("Connect Wallet"));
        assert!(html.contains("3/20 have been minted"));
        assert!(html.contains(r#"content="5""#));
    }

    #[test]
    fn test_loading_hides_buttons() {
        let html = page(
            &view_with(ConsoleFlags {
                loading: true,
                ..Default::default()
            }),
            5,
            "/0.svg",
        );
        assert!(html.contains("Loading..."));
        assert!(!html.contains("<button"));
    }

    #[test]
    fn test_presale_active_offers_presale_mint() {
        let html = page(
            &view_with(ConsoleFlags {
                wallet_connected: true,
                presale_started: true,
                ..Default::default()
            }),
            5,
            "/0.svg",
        );
        assert!(html.contains(r#"action="/mint/presale""#));
        assert!(html.contains(r#"data-phase="presale_active""#));
        assert!(!html.contains("Public Mint"));
    }

    #[test]
    fn test_phase_body_has_message_then_button() {
        let view = view_with(ConsoleFlags {
            wallet_connected: true,
            presale_started: true,
            presale_ended: true,
            ..Default::default()
        });
        let body = body(&view);
        let message = body.find(r#"<span class="description">"#).unwrap();
        let button = body.find("Public Mint").unwrap();
        assert!(message < button);
        assert!(body.ends_with("</form>"));
    }

    #[test]
    fn test_banners_are_escaped() {
        let mut view = view_with(ConsoleFlags::default());
        view.network_warning = Some("<script>x</script>".into());
        view.notice = Some("You successfully minted a CryptoDev!".into());
        let html = page(&view, 5, "/0.svg");
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains(r#"<div class="notice">You successfully minted a CryptoDev!</div>"#));
    }
}
