//! Printable focus-group report.
//!
//! A single self-contained HTML document: a settings summary followed by the
//! transcript, styled for A4 print-to-PDF.

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::models::{Participant, SessionSettings, Turn};
use crate::render::avatar::{AvatarContext, AvatarReference, MODERATOR_ACCENT};
use crate::stages::parse::resolve_participant;

const REPORT_TITLE: &str = "焦點座談模擬報告";
const FREE_DISCUSSION: &str = "自由討論 (無特定子議題)";
const NO_TAGS: &str = "無標籤";

const STYLES: &str = r#"
    @page { size: A4; margin: 1.5cm; }
    body {
      font-family: "Microsoft JhengHei", "Heiti TC", sans-serif;
      color: #333;
      max-width: 800px;
      margin: 0 auto;
      -webkit-print-color-adjust: exact;
      print-color-adjust: exact;
    }
    .settings-box {
      background-color: #f8fafc;
      border: 1px solid #e2e8f0;
      border-radius: 8px;
      padding: 20px;
      margin-bottom: 30px;
      font-size: 13px;
    }
    .settings-box h2 { margin-top: 0; border-bottom: 2px solid #333; padding-bottom: 8px; }
    .grid-info { display: grid; grid-template-columns: 1fr 1fr; gap: 10px; margin-bottom: 15px; }
    .section-title { font-weight: bold; margin-top: 10px; color: #475569; border-bottom: 1px dashed #cbd5e1; padding-bottom: 4px; margin-bottom: 6px; }
    .tag-list, .subtopic-list { margin: 5px 0; padding-left: 20px; }
    .role-badge { background: #e2e8f0; padding: 2px 6px; border-radius: 4px; font-size: 11px; font-weight: bold; margin-right: 5px; }
    .tags { color: #64748b; font-size: 12px; }
    .transcript-title { text-align: center; margin-bottom: 20px; font-size: 18px; font-weight: bold; }
    .message-block { margin-bottom: 20px; page-break-inside: avoid; display: flex; gap: 15px; justify-content: flex-start; }
    .message-block.host-block { justify-content: center; }
    .avatar-box { width: 50px; display: flex; flex-direction: column; align-items: center; flex-shrink: 0; }
    .avatar-img { width: 45px; height: 45px; border-radius: 50%; border: 2px solid #e2e8f0; background-color: #fff; object-fit: cover; }
    .roster-number { font-size: 10px; color: #94a3b8; margin-top: 2px; }
    .content-box { flex: 1; }
    .host-block .content-box { flex: 0 1 75%; text-align: center; }
    .speaker-header { font-size: 14px; font-weight: bold; margin-bottom: 4px; color: #1e293b; display: flex; align-items: center; gap: 8px; }
    .host-block .speaker-header { justify-content: center; }
    .round-badge { background: #f1f5f9; color: #64748b; font-size: 10px; padding: 1px 6px; border-radius: 10px; font-weight: normal; }
    .text-content {
      text-align: justify;
      white-space: pre-wrap;
      font-size: 14px;
      line-height: 1.6;
      padding: 10px 15px;
      background-color: #fff;
      border: 1px solid #e2e8f0;
      border-radius: 0 12px 12px 12px;
    }
    .host-bubble { text-align: center; background-color: #fffbeb; border-color: #fde68a; border-radius: 12px; }
"#;

/// Escape text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the printable report for one session
pub struct TranscriptDocument<'a> {
    settings: &'a SessionSettings,
    turns: &'a [Turn],
    rendered_at: NaiveDateTime,
}

impl<'a> TranscriptDocument<'a> {
    pub fn new(settings: &'a SessionSettings, turns: &'a [Turn], rendered_at: NaiveDateTime) -> Self {
        Self {
            settings,
            turns,
            rendered_at,
        }
    }

    /// Render the full HTML document
    pub fn render(&self) -> String {
        let topic = escape_html(&self.settings.topic);
        let mut html = String::new();

        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>焦點座談逐字稿 - {}</title>\n<style>{}</style>\n</head>\n<body>\n<h1>{}</h1>\n",
            topic, STYLES, REPORT_TITLE
        );
        html.push_str(&self.render_settings());
        html.push_str("<div class=\"transcript-title\">--- 對話逐字稿 ---</div>\n");
        html.push_str("<div class=\"transcript\">\n");
        for turn in self.turns {
            html.push_str(&self.render_turn(turn));
        }
        html.push_str("</div>\n</body>\n</html>\n");

        html
    }

    fn render_settings(&self) -> String {
        let mut html = String::from("<div class=\"settings-box\">\n<h2>會議設定摘要</h2>\n");

        let _ = write!(
            html,
            "<div class=\"grid-info\">\n\
             <div class=\"info-item\"><strong>討論主題：</strong>{}</div>\n\
             <div class=\"info-item\"><strong>預計輪數：</strong>{} 輪</div>\n\
             <div class=\"info-item\"><strong>列印時間：</strong>{}</div>\n\
             </div>\n",
            escape_html(&self.settings.topic),
            self.settings.rounds,
            self.rendered_at.format("%Y/%m/%d %H:%M:%S")
        );

        html.push_str("<div class=\"section-title\">參與者名單</div>\n<ul class=\"tag-list\">\n");
        for participant in &self.settings.participants {
            html.push_str(&render_roster_entry(participant));
        }
        html.push_str("</ul>\n");

        html.push_str("<div class=\"section-title\">待討論子議題</div>\n<ol class=\"subtopic-list\">\n");
        if self.settings.sub_topics.is_empty() {
            let _ = writeln!(html, "<li>{}</li>", FREE_DISCUSSION);
        } else {
            for sub_topic in &self.settings.sub_topics {
                let _ = writeln!(html, "<li>{}</li>", escape_html(&sub_topic.content));
            }
        }
        html.push_str("</ol>\n</div>\n");

        html
    }

    fn render_turn(&self, turn: &Turn) -> String {
        let participants = &self.settings.participants;
        let participant = resolve_participant(&turn.participant_code, participants);
        let avatar = AvatarReference::for_speaker(&turn.participant_code, participant, AvatarContext::Print);
        let is_moderator = turn.is_moderator();
        let label = escape_html(&turn.participant_code);

        let (block_class, avatar_style, bubble_class) = if is_moderator {
            (
                "message-block host-block",
                format!(" style=\"border-color: #{}\"", MODERATOR_ACCENT),
                "text-content host-bubble",
            )
        } else {
            ("message-block", String::new(), "text-content")
        };

        let roster_number = match participant {
            Some(p) if !is_moderator => participants
                .iter()
                .position(|c| c.id == p.id)
                .map(|i| format!("<span class=\"roster-number\">{}</span>", i + 1))
                .unwrap_or_default(),
            _ => String::new(),
        };

        format!(
            "<div class=\"{block_class}\">\n\
             <div class=\"avatar-box\"><img src=\"{src}\" alt=\"{label}\" class=\"avatar-img\"{avatar_style} />{roster_number}</div>\n\
             <div class=\"content-box\">\n\
             <div class=\"speaker-header\">{label} <span class=\"round-badge\">第 {round} 輪</span></div>\n\
             <div class=\"{bubble_class}\">{content}</div>\n\
             </div>\n\
             </div>\n",
            src = escape_html(&avatar.url()),
            round = turn.round,
            content = escape_html(&turn.content),
        )
    }
}

fn render_roster_entry(participant: &Participant) -> String {
    let tags = if participant.tags.is_empty() {
        NO_TAGS.to_string()
    } else {
        escape_html(&participant.tags.join(", "))
    };
    format!(
        "<li><span class=\"role-badge\">{}</span>{} <span class=\"tags\">({})</span></li>\n",
        escape_html(&participant.role),
        escape_html(&participant.name),
        tags
    )
}

/// Render the printable report
pub fn render_document(
    settings: &SessionSettings,
    turns: &[Turn],
    rendered_at: NaiveDateTime,
) -> String {
    TranscriptDocument::new(settings, turns, rendered_at).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubTopic, UNKNOWN_PARTICIPANT_ID};
    use chrono::{DateTime, NaiveDate, Utc};

    fn rendered_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn settings() -> SessionSettings {
        let mut settings = SessionSettings::new(
            "遠距工作 & 生產力",
            vec![
                Participant {
                    id: "p1".to_string(),
                    name: "王小明".to_string(),
                    role: "工程師".to_string(),
                    tags: vec!["男".to_string(), "30歲".to_string()],
                    system_prompt: String::new(),
                },
                Participant {
                    id: "p2".to_string(),
                    name: "林美華".to_string(),
                    role: "設計師".to_string(),
                    tags: vec![],
                    system_prompt: String::new(),
                },
            ],
        );
        settings.rounds = 4;
        settings
    }

    fn turn(id: usize, code: &str, participant_id: &str, content: &str) -> Turn {
        Turn {
            id,
            participant_id: participant_id.to_string(),
            participant_code: code.to_string(),
            content: content.to_string(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            round: 1,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"A\" & 'B'</b>"), "&lt;b&gt;&quot;A&quot; &amp; &#39;B&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_settings_summary() {
        let html = render_document(&settings(), &[], rendered_at());

        assert!(html.contains("<strong>討論主題：</strong>遠距工作 &amp; 生產力"));
        assert!(html.contains("<strong>預計輪數：</strong>4 輪"));
        assert!(html.contains("2024/05/01 14:30:00"));
        assert!(html.contains("<span class=\"role-badge\">工程師</span>王小明 <span class=\"tags\">(男, 30歲)</span>"));
        assert!(html.contains("林美華 <span class=\"tags\">(無標籤)</span>"));
        assert!(html.contains("<li>自由討論 (無特定子議題)</li>"));
        assert!(html.contains("@page { size: A4; margin: 1.5cm; }"));
    }

    #[test]
    fn test_sub_topics_listed_in_order() {
        let mut settings = settings();
        settings.sub_topics = vec![SubTopic::new("通勤"), SubTopic::new("溝通")];
        let html = render_document(&settings, &[], rendered_at());

        let first = html.find("<li>通勤</li>").unwrap();
        let second = html.find("<li>溝通</li>").unwrap();
        assert!(first < second);
        assert!(!html.contains(FREE_DISCUSSION));
    }

    #[test]
    fn test_moderator_turn_is_centered_with_accent() {
        let turns = vec![
            turn(0, "主持人", UNKNOWN_PARTICIPANT_ID, "歡迎"),
            turn(1, "王小明", "p1", "<大家好>"),
        ];
        let html = render_document(&settings(), &turns, rendered_at());

        assert!(html.contains("<div class=\"message-block host-block\">"));
        assert!(html.contains("bottts-neutral/svg?seed=Host&amp;backgroundColor=facc15"));
        assert!(html.contains("style=\"border-color: #facc15\""));
        assert!(html.contains("<div class=\"text-content host-bubble\">歡迎</div>"));

        assert!(html.contains("notionists/svg?seed=p1male&amp;backgroundColor=transparent"));
        assert!(html.contains("<div class=\"text-content\">&lt;大家好&gt;</div>"));
        assert!(html.contains("<span class=\"roster-number\">1</span>"));
        assert_eq!(html.matches("host-block\"").count(), 1);
    }

    #[test]
    fn test_moderator_styling_ignores_roster_entries() {
        let mut settings = settings();
        settings.participants.push(Participant {
            id: "p3".to_string(),
            name: "主持人".to_string(),
            role: "引言人".to_string(),
            tags: vec!["女".to_string()],
            system_prompt: String::new(),
        });
        settings.participants.push(Participant {
            id: "p4".to_string(),
            name: "陳大同".to_string(),
            role: "主持人".to_string(),
            tags: vec![],
            system_prompt: String::new(),
        });
        let turns = vec![turn(0, "主持人", "p3", "歡迎")];
        let html = render_document(&settings, &turns, rendered_at());

        assert!(html.contains("<div class=\"message-block host-block\">"));
        assert!(html.contains("bottts-neutral/svg?seed=Host&amp;backgroundColor=facc15"));
        assert!(html.contains("<div class=\"text-content host-bubble\">歡迎</div>"));
        assert!(!html.contains("<span class=\"roster-number\">"));
        assert!(!html.contains("seed=p3"));
        assert!(!html.contains("seed=p4"));
    }

    #[test]
    fn test_transcript_follows_settings() {
        let turns = vec![turn(0, "林美華", "p2", "我先說")];
        let html = render_document(&settings(), &turns, rendered_at());

        let summary = html.find("會議設定摘要").unwrap();
        let transcript = html.find("對話逐字稿 ---").unwrap();
        let message = html.find("我先說").unwrap();
        assert!(summary < transcript && transcript < message);
        assert!(html.contains("第 1 輪"));
    }
}
