use console::style;

use scripture_core::types::{SearchMethod, SearchResult};
use scripture_hybrid::{ResponseBody, SearchResponse};

pub fn print_response(response: &SearchResponse, show_scores: bool) {
    println!();
    println!("{}", style("===== Scripture Search Results =====").cyan().bold());
    println!("{} {}", style("Query:").cyan(), style(&response.query).bold());
    println!("{} {}", style("Search Type:").cyan(), style(response.search_type).bold());
    println!("{} {}", style("Total Results:").cyan(), style(response.total_results).bold());
    println!("{} {}", style("Execution Time:").cyan(), style(format!("{:.3} seconds", response.execution_time)).bold());
    println!();

    match &response.body {
        ResponseBody::CategorizedResults(grouped) => {
            for book in grouped.books() {
                println!("{}", style(&book.name).green().bold());
                for chapter in &book.chapters {
                    println!("  {}", style(&chapter.name).yellow());
                    for result in &chapter.results {
                        println!("    - {}", verse_line(result, show_scores));
                    }
                    println!();
                }
            }
        }
        ResponseBody::Results(results) => {
            for result in results {
                println!("{} - {}", style(&result.verse.book_name).green().bold(), style(&result.verse.chapter_name).yellow());
                println!("  - {}\n", verse_line(result, show_scores));
            }
        }
    }
}

fn verse_line(result: &SearchResult, show_scores: bool) -> String {
    let mut line = format!("{}: {}", style(&result.verse.name).bold(), result.verse.text);
    if let (true, Some(score)) = (show_scores, result.score) {
        // Cosine scores are shown as percentages like the others.
        let pct = match result.search_method {
            SearchMethod::Semantic | SearchMethod::Topic if score <= 1.0 => score * 100.0,
            _ => score,
        };
        line.push_str(&format!(" {}", style(format!("[Score: {pct:.2}%]")).dim()));
    }
    line
}
