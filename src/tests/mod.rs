use std::{
    collections::HashMap,
    io::{Cursor, Write as _},
    num::NonZeroU32,
    sync::{Arc, Mutex},
};

use url::Url;
use zip::write::SimpleFileOptions;

use crate::{
    ApiCache, Client, ColumnValue, Config, Contest, Error, PageShape, Problem,
    ProblemListOptions, SubmissionOutcome, SubmissionStatus, cache,
    transport::{self, Body, Method, Request, Response, Transport},
};

struct Route {
    status: u16,
    final_url: Option<Url>,
    body: Vec<u8>,
    encoding: &'static str,
}

/// Serves canned responses and records every request it sees.
#[derive(Default)]
struct FakeTransport {
    routes: HashMap<(Method, String), Route>,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    fn page(mut self, method: Method, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            (method, url.to_owned()),
            Route {
                status: 200,
                final_url: None,
                body: body.into(),
                encoding: "utf-8",
            },
        );
        self
    }

    fn redirect(mut self, method: Method, url: &str, to: &str, body: &str) -> Self {
        self.routes.insert(
            (method, url.to_owned()),
            Route {
                status: 200,
                final_url: Some(Url::parse(to).unwrap()),
                body: body.as_bytes().to_vec(),
                encoding: "utf-8",
            },
        );
        self
    }

    fn status(mut self, method: Method, url: &str, status: u16) -> Self {
        self.routes.insert(
            (method, url.to_owned()),
            Route {
                status,
                final_url: None,
                body: Vec::new(),
                encoding: "utf-8",
            },
        );
        self
    }

    fn page_encoded(
        mut self,
        url: &str,
        body: impl Into<Vec<u8>>,
        encoding: &'static str,
    ) -> Self {
        self.routes.insert(
            (Method::Get, url.to_owned()),
            Route {
                status: 200,
                final_url: None,
                body: body.into(),
                encoding,
            },
        );
        self
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn requested(&self, method: Method, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.method == method && request.url.as_str() == url)
            .count()
    }
}

impl Transport for FakeTransport {
    async fn request(&self, request: Request) -> Result<Response, transport::Error> {
        self.requests.lock().unwrap().push(request.clone());
        let key = (request.method, request.url.to_string());
        Ok(match self.routes.get(&key) {
            Some(route) => Response {
                status: route.status,
                final_url: route.final_url.clone().unwrap_or(request.url),
                body: route.body.clone(),
                encoding: Some(route.encoding.into()),
            },
            None => Response {
                status: 404,
                final_url: request.url,
                body: b"not found".to_vec(),
                encoding: None,
            },
        })
    }
}

fn client(transport: FakeTransport) -> Client<FakeTransport> {
    Client::new(
        transport,
        Config::with_base_url(Url::parse("https://judge.example/").unwrap()),
    )
}

const HOME: &str = "https://judge.example/";
const PROBLEM: &str = "https://judge.example/problems/no/1";
const SUBMIT: &str = "https://judge.example/problems/no/1/submit";
const TESTCASE: &str = "https://judge.example/problems/no/1/testcase.zip";

fn zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_sample_cases() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        PROBLEM,
        include_str!("pages/problem.html"),
    ));
    let samples = client
        .download_sample_cases(&Problem::No(1))
        .await
        .unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].name, "サンプル1");
    assert_eq!(samples[0].input_name, "サンプル1 入力");
    assert_eq!(samples[0].input, b"3\n100\n3\n1 2 1\n");
    assert_eq!(samples[0].output_name, "サンプル1 出力");
    assert_eq!(samples[0].output, b"8\n");
    assert_eq!(samples[1].name, "サンプル2");
    assert_eq!(samples[1].input, b"2\n0\n1\n1\n");
    assert_eq!(samples[1].output, b"-1\n");
}

#[tokio::test]
async fn test_sample_cases_from_shift_jis_page() {
    let page = r#"<div class="sample"><h5>サンプル1</h5><div class="paragraph">
<h6>入力</h6><pre>入力 1</pre><h6>出力</h6><pre>出力 2</pre></div></div>"#;
    let (body, _, _) = encoding_rs::SHIFT_JIS.encode(page);
    let client = client(FakeTransport::default().page_encoded(
        PROBLEM,
        body.into_owned(),
        "Shift_JIS",
    ));
    let samples = client
        .download_sample_cases(&Problem::No(1))
        .await
        .unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].input_name, "サンプル1 入力");
    assert_eq!(samples[0].input, "入力 1\n".as_bytes());
    assert_eq!(samples[0].output, "出力 2\n".as_bytes());
}

#[tokio::test]
async fn test_missing_problem_page_is_a_transport_error() {
    let client = client(FakeTransport::default());
    assert!(matches!(
        client.download_sample_cases(&Problem::No(1)).await,
        Err(Error::Transport(transport::Error::Status { status: 404, .. }))
    ));
}

#[tokio::test]
async fn test_system_cases_require_login() {
    let client = client(
        FakeTransport::default()
            .page(Method::Get, HOME, include_str!("pages/home_anonymous.html"))
            .page(Method::Get, TESTCASE, zip(&[])),
    );
    assert!(matches!(
        client.download_system_cases(&Problem::No(1)).await,
        Err(Error::NotAuthenticated)
    ));
    assert_eq!(client.transport().requested(Method::Get, TESTCASE), 0);
}

#[tokio::test]
async fn test_system_cases() {
    let archive = zip(&[
        ("test_in/case_02.txt", "5\n"),
        ("test_out/case_02.txt", "120\n"),
        ("test_in/case_01.txt", "3\n"),
        ("test_out/case_01.txt", "6\n"),
    ]);
    let client = client(
        FakeTransport::default()
            .page(Method::Get, HOME, include_str!("pages/home_logged_in.html"))
            .page(Method::Get, TESTCASE, archive),
    );
    let cases = client
        .download_system_cases(&Problem::No(1))
        .await
        .unwrap();
    assert_eq!(
        cases.iter().map(|case| case.name.as_str()).collect::<Vec<_>>(),
        ["case_01.txt", "case_02.txt"]
    );
    assert_eq!(cases[1].input, b"5\n");
    assert_eq!(cases[1].output, b"120\n");
}

#[tokio::test]
async fn test_submit_accepted() {
    let client = client(
        FakeTransport::default()
            .page(Method::Get, SUBMIT, include_str!("pages/submit_form.html"))
            .redirect(
                Method::Post,
                SUBMIT,
                "https://judge.example/submissions/314087",
                "<p>judging</p>",
            ),
    );
    let outcome = client
        .submit_code(&Problem::No(1), b"fn main() {}\n", "rust", Some("main.rs"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Accepted(Url::parse("https://judge.example/submissions/314087").unwrap())
    );

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 2);
    let Body::Multipart(form) = &requests[1].body else {
        panic!("expected a multipart post");
    };
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(form.field("lang"), Some("rust"));
    assert_eq!(form.field("csrf_token"), Some("6a2f0c"));
    assert_eq!(form.field("custom_test"), None);
    let file = form.file("file").unwrap();
    assert_eq!(file.filename, "main.rs");
    assert_eq!(file.content, b"fn main() {}\n");
}

#[tokio::test]
async fn test_submit_uses_default_filename() {
    let client = client(
        FakeTransport::default()
            .page(Method::Get, SUBMIT, include_str!("pages/submit_form.html"))
            .redirect(
                Method::Post,
                SUBMIT,
                "https://judge.example/submissions/314088",
                "",
            ),
    );
    client
        .submit_code(&Problem::No(1), b"print(1)", "python3", None)
        .await
        .unwrap();
    let requests = client.transport().requests();
    let Body::Multipart(form) = &requests[1].body else {
        panic!("expected a multipart post");
    };
    assert_eq!(form.file("file").unwrap().filename, "code");
}

#[tokio::test]
async fn test_submit_posts_even_without_form_method() {
    let client = client(
        FakeTransport::default()
            .page(
                Method::Get,
                SUBMIT,
                r#"<form id="submit_form" action="/problems/no/1/submit"><input type="hidden" name="csrf_token" value="x"></form>"#,
            )
            .redirect(
                Method::Post,
                SUBMIT,
                "https://judge.example/submissions/314089",
                "",
            ),
    );
    let outcome = client
        .submit_code(&Problem::No(1), b"int main(){}", "cpp17", None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Accepted(Url::parse("https://judge.example/submissions/314089").unwrap())
    );
    let requests = client.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[1].url.as_str(), SUBMIT);
    let Body::Multipart(form) = &requests[1].body else {
        panic!("expected a multipart post");
    };
    assert_eq!(form.field("csrf_token"), Some("x"));
    assert_eq!(form.field("lang"), Some("cpp17"));
    assert_eq!(form.file("file").unwrap().content, b"int main(){}");
}

#[tokio::test]
async fn test_submit_not_logged_in_never_posts() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        SUBMIT,
        include_str!("pages/submit_anonymous.html"),
    ));
    let outcome = client
        .submit_code(&Problem::No(1), b"code", "cpp17", None)
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::NotLoggedIn);
    assert_eq!(client.transport().requested(Method::Post, SUBMIT), 0);
}

#[tokio::test]
async fn test_submit_rejected_collects_alerts() {
    let client = client(
        FakeTransport::default()
            .page(Method::Get, SUBMIT, include_str!("pages/submit_form.html"))
            .page(Method::Post, SUBMIT, include_str!("pages/submit_rejected.html")),
    );
    let outcome = client
        .submit_code(&Problem::No(1), b"", "cpp17", None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Rejected(vec!["提出間隔が短すぎます".into(), "コードが空です".into()])
    );
}

#[tokio::test]
async fn test_submit_twice_posts_twice() {
    let client = client(
        FakeTransport::default()
            .page(Method::Get, SUBMIT, include_str!("pages/submit_form.html"))
            .redirect(
                Method::Post,
                SUBMIT,
                "https://judge.example/submissions/314087",
                "",
            ),
    );
    for _ in 0..2 {
        client
            .submit_code(&Problem::No(1), b"code", "cpp17", None)
            .await
            .unwrap();
    }
    assert_eq!(client.transport().requested(Method::Post, SUBMIT), 2);
}

#[tokio::test]
async fn test_submit_server_error_is_fatal() {
    let client = client(
        FakeTransport::default()
            .page(Method::Get, SUBMIT, include_str!("pages/submit_form.html"))
            .status(Method::Post, SUBMIT, 500),
    );
    assert!(matches!(
        client
            .submit_code(&Problem::No(1), b"code", "cpp17", None)
            .await,
        Err(Error::Transport(transport::Error::Status { status: 500, .. }))
    ));
}

#[tokio::test]
async fn test_list_submissions() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        "https://judge.example/submissions?page=3&status=AC",
        include_str!("pages/submissions.html"),
    ));
    let records = client
        .list_submissions(NonZeroU32::new(3).unwrap(), Some(SubmissionStatus::AC))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(first["#"], ColumnValue::Integer(314087));
    assert_eq!(first["#/url"], ColumnValue::Text("/submissions/314087".into()));
    assert_eq!(first["提出者"], ColumnValue::Text("kmjp".into()));
    assert_eq!(first["結果"], ColumnValue::Text("AC".into()));
    assert_eq!(first["コード長"], ColumnValue::Text("1,234 bytes".into()));
    assert!(!first.contains_key(""));
    assert!(!first.contains_key("/url"));
    assert!(!records[1].contains_key("提出者/url"));
}

#[tokio::test]
async fn test_list_submissions_rejects_unexpected_header() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        "https://judge.example/submissions?page=1",
        include_str!("pages/problems.html"),
    ));
    assert!(matches!(
        client
            .list_submissions(NonZeroU32::MIN, None)
            .await,
        Err(Error::PageShape {
            detail: PageShape::UnexpectedColumns { .. },
            ..
        })
    ));
}

#[tokio::test]
async fn test_list_problems() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        "https://judge.example/problems/other?page=2&sort=level_desc",
        include_str!("pages/problems.html"),
    ));
    let options = ProblemListOptions {
        other: true,
        comp_problem: false,
        sort: Some(crate::ProblemSort::LevelDesc),
    };
    let records = client
        .list_problems(NonZeroU32::new(2).unwrap(), &options)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["ナンバー"], ColumnValue::Integer(1));
    assert_eq!(records[0]["レベル"], ColumnValue::Text("2.5".into()));
    assert_eq!(
        records[0]["タグ"],
        ColumnValue::List(vec!["DP".into(), "グラフ".into()])
    );
    assert_eq!(records[0]["解いた人数"], ColumnValue::Integer(1200));
    assert_eq!(records[0]["問題名/url"], ColumnValue::Text("/problems/no/1".into()));
    assert_eq!(records[1]["レベル"], ColumnValue::Text("1".into()));
    assert_eq!(records[1]["タグ"], ColumnValue::List(vec![]));
    assert_eq!(records[1]["Fav"], ColumnValue::Integer(12));
}

#[tokio::test]
async fn test_available_languages_and_input_format() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        PROBLEM,
        include_str!("pages/problem.html"),
    ));
    let languages = client
        .list_available_languages(&Problem::No(1))
        .await
        .unwrap();
    assert_eq!(
        languages
            .iter()
            .map(|language| (language.id.as_str(), language.name.as_str()))
            .collect::<Vec<_>>(),
        [
            ("cpp17", "C++17 (gcc 13.2.0)"),
            ("rust", "Rust (1.77.0)"),
            ("python3", "Python3 (3.12.0 + numpy 1.26.1)"),
        ]
    );
    assert_eq!(
        client.input_format(&Problem::No(1)).await.unwrap().as_deref(),
        Some("N\nC\nV\nS_1 S_2 ... S_V")
    );
}

#[tokio::test]
async fn test_login_probe() {
    let anonymous = client(FakeTransport::default().page(
        Method::Get,
        HOME,
        include_str!("pages/home_anonymous.html"),
    ));
    assert!(!anonymous.is_logged_in().await.unwrap());
    let logged_in = client(FakeTransport::default().page(
        Method::Get,
        HOME,
        include_str!("pages/home_logged_in.html"),
    ));
    assert!(logged_in.is_logged_in().await.unwrap());
}

const API_PROBLEMS: &str = r#"[
    {"No": 1, "ProblemId": 1476, "Title": "道のショートカット"},
    {"No": 2, "ProblemId": 1477, "Title": "素因数ゲーム"},
    {"No": 3, "ProblemId": 1478, "Title": "ビットすごろく"}
]"#;

fn api_transport() -> FakeTransport {
    FakeTransport::default()
        .page(Method::Get, "https://judge.example/api/v1/problems", API_PROBLEMS)
        .page(
            Method::Get,
            "https://judge.example/api/v1/contest/past",
            r#"[{"Id": 276, "Name": "past", "ProblemIdList": [1478, 1476]}]"#,
        )
        .page(
            Method::Get,
            "https://judge.example/api/v1/contest/future",
            r#"[{"Id": 300, "Name": "future", "ProblemIdList": [1477]}]"#,
        )
}

#[tokio::test]
async fn test_contest_problems_from_cached_api() {
    let client = client(api_transport());
    assert_eq!(
        client
            .list_contest_problems(&Contest { contest_id: 276 })
            .await
            .unwrap(),
        [Problem::No(3), Problem::No(1)]
    );
    assert_eq!(
        client
            .list_contest_problems(&Contest { contest_id: 300 })
            .await
            .unwrap(),
        [Problem::No(2)]
    );
    assert!(matches!(
        client
            .list_contest_problems(&Contest { contest_id: 1 })
            .await,
        Err(Error::Resolution(cache::Unresolved::Contest(1)))
    ));
    // three API calls in total, all from the first lookup
    assert_eq!(client.transport().requests().len(), 3);
}

#[tokio::test]
async fn test_shared_cache_is_injected() {
    let cache = Arc::new(ApiCache::preloaded(
        serde_json::from_str(API_PROBLEMS).unwrap(),
        serde_json::from_str(r#"[{"Id": 7, "ProblemIdList": [1477]}]"#).unwrap(),
    ));
    let client = Client::with_cache(
        FakeTransport::default(),
        Config::with_base_url(Url::parse("https://judge.example/").unwrap()),
        cache,
    );
    assert_eq!(
        client
            .list_contest_problems(&Contest { contest_id: 7 })
            .await
            .unwrap(),
        [Problem::No(2)]
    );
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_broken_api_response() {
    let client = client(FakeTransport::default().page(
        Method::Get,
        "https://judge.example/api/v1/problems",
        "<html>maintenance</html>",
    ));
    assert!(matches!(
        client.api_problems().await,
        Err(Error::DecodeApi { .. })
    ));
}
