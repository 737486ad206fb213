#![allow(dead_code)]

use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use survey_webup::interpret::{InterpretError, LlmClient};

/// Three questions, one branching rule (SQ1 answer 2 skips to A1).
pub const THREE_QUESTIONS: &str = r#"```json
{
  "title": "고객 만족도 조사",
  "instructions": "해당하는 보기를 선택해 주세요.",
  "questions": [
    {
      "ordinal": 1,
      "label": "SQ1",
      "text": "SQ1. 귀하의 성별은?",
      "answer_type": "single_choice",
      "options": ["1) 남성", "2) 여성"],
      "branch": {"if_answer": [2], "action": {"goto": 3}}
    },
    {
      "ordinal": 2,
      "label": "SQ2",
      "text": "이용해 본 채널을 모두 선택해 주세요.",
      "answer_type": "multi_choice",
      "options": ["매장", "온라인", "모바일 앱"],
      "programming_logic": "보기 로테이션",
      "response_guide": "해당하는 것을 모두 선택",
      "branch": null
    },
    {
      "ordinal": 3,
      "label": "A1",
      "text": "개선되었으면 하는 점을 적어주세요.",
      "answer_type": "open_text",
      "options": [],
      "validation_logic": "10자 이상"
    }
  ]
}
```"#;

enum Reply {
    Text(String),
    Fail { status: Option<u16>, message: String },
}

/// Canned language model. Counts calls and remembers the last prompt.
pub struct MockClient {
    reply: Reply,
    calls: AtomicUsize,
    last_user: Mutex<Option<String>>,
}

impl MockClient {
    pub fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn failing(status: Option<u16>, message: &str) -> Self {
        Self::new(Reply::Fail {
            status,
            message: message.to_string(),
        })
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_user: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockClient {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _system: &str, user: &str) -> Result<String, InterpretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user.lock().unwrap() = Some(user.to_string());
        match &self.reply {
            Reply::Text(t) => Ok(t.clone()),
            Reply::Fail { status, message } => Err(InterpretError::ApiFailure {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

pub fn docx_fixture() -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

    let cell = |text: &str| {
        TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
    };
    let mut buf = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("고객 만족도 조사")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("SQ1. 귀하의 성별은?")))
        .add_table(Table::new(vec![
            TableRow::new(vec![cell("1) 남성"), cell("2) 여성")]),
            TableRow::new(vec![cell("SQ2"), cell("이용 채널")]),
        ]))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("A1. 개선점을 적어주세요.")))
        .build()
        .pack(&mut buf)
        .expect("pack docx");
    buf.into_inner()
}

pub fn xlsx_fixture() -> Vec<u8> {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();
    let s1 = wb.add_worksheet();
    s1.set_name("스크리너").unwrap();
    s1.write_string(0, 0, "SQ1").unwrap();
    s1.write_string(0, 1, "귀하의 연령은?").unwrap();
    s1.write_string(1, 1, "20대").unwrap();
    s1.write_number(1, 2, 3).unwrap();
    let s2 = wb.add_worksheet();
    s2.set_name("본설문").unwrap();
    s2.write_string(0, 0, "A1").unwrap();
    s2.write_string(0, 1, "전반적인 만족도는?").unwrap();
    wb.save_to_buffer().expect("save xlsx")
}

/// Minimal PDF, one Helvetica text line per page. An empty string makes a
/// page with no text layer.
pub fn pdf_fixture(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {n} >>", kids.join(" ")),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        let content_id = 5 + 2 * i;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }
    let xref = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for off in offsets {
        out.push_str(&format!("{off:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}
