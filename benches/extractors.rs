// benches/extractors.rs
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use paatshala_scrape::specs::{assign, grading, quiz};

/// Grading page with `n` students, each with two uploaded files.
fn grading_page(n: usize) -> String {
    let mut rows = String::new();
    for i in 0..n {
        rows.push_str("<tr>");
        for c in 0..14 {
            let cell = match c {
                2 => format!(r#"<a href="/user/view.php?id={i}">Student {i}</a>"#),
                4 => s("<div>Submitted for grading</div><div>Graded</div>"),
                8 => format!(
                    r#"<div class="fileuploadsubmission"><a href="/pluginfile.php/{i}/a.pdf">a{i}.pdf</a></div>
                       <div class="fileuploadsubmission"><a href="/pluginfile.php/{i}/b.pdf">b{i}.pdf</a></div>"#
                ),
                13 => format!("{}.00 / 10.00", i % 11),
                _ => s("&nbsp;"),
            };
            rows.push_str(&format!("<td>{cell}</td>"));
        }
        rows.push_str("</tr>");
    }
    format!(r#"<html><body><table class="flexible generaltable generalbox"><thead><tr><th>x</th></tr></thead><tbody>{rows}</tbody></table></body></html>"#)
}

/// Quiz report with `n` students × 3 attempts.
fn quiz_page(n: usize) -> String {
    let mut rows = String::new();
    for i in 0..n {
        for a in 0..3 {
            rows.push_str(&format!(
                r#"<tr><td></td><td></td><td><a href="/user/view.php?id={i}">Student {i}</a></td><td></td><td></td><td></td><td></td><td></td><td>{}.50</td></tr>"#,
                (i + a) % 10
            ));
        }
    }
    format!(r#"<table class="generaltable"><tr><th>h</th></tr>{rows}</table>"#)
}

fn assign_page() -> String {
    let overview = (0..40)
        .map(|i| format!("<tr><th>Extra label {i}</th><td>value {i}</td></tr>"))
        .collect::<String>();
    format!(
        r#"<table>{overview}<tr><th>Participants</th><td>32</td></tr><tr><th>Due date</th><td>12 June</td></tr></table>
           <table><tr><th>Submission status</th><td>Submitted</td></tr><tr><th>Due date</th><td>15 June</td></tr>
           <tr><th>Submission comments</th><td><a href="comments.php">Comments (2)</a></td></tr></table>"#
    )
}

fn s(v: &str) -> String {
    v.to_string()
}

fn bench_extractors(c: &mut Criterion) {
    let grading_doc = grading_page(120);
    let quiz_doc = quiz_page(120);
    let assign_doc = assign_page();

    c.bench_function("grading_120_students", |b| {
        b.iter(|| {
            let rows = grading::parse_grading(black_box(&grading_doc));
            black_box(rows.map(|r| r.len()))
        })
    });

    c.bench_function("quiz_report_360_attempts", |b| {
        b.iter(|| {
            let rec = quiz::parse_report(black_box(&quiz_doc));
            black_box(rec.map(|r| r.len()))
        })
    });

    c.bench_function("assignment_detail", |b| {
        b.iter(|| black_box(assign::parse(black_box(&assign_doc))))
    });
}

criterion_group!(benches, bench_extractors);
criterion_main!(benches);
