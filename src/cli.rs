//! Command-line surface over the list store and the analysis flow
//!
//! Each invocation opens the configured list storage plus the on-disk session
//! store, runs one command and prints whatever notifications the list store
//! raised along the way.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::{
    config::Config,
    db::{open_session_store, open_store, KeyValueStore},
    error::AppError,
    models::{ListType, MovieDetails, MovieSelection},
    services::{
        analysis::{Analysis, Analyzer},
        providers::{
            details_for_title, gemini::GeminiProvider, omdb::OmdbProvider, AnalysisProvider,
            MetadataProvider,
        },
        posters::{self, PlacedPoster},
        wordcloud::ranked,
    },
    store::{CardBoard, ListStore, NotificationCenter, NotificationKind},
};

/// Find movies like the ones you love, and keep track of what to watch next.
#[derive(Debug, Parser)]
#[command(name = "moviematch", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pick at least three movies to analyze
    Select {
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// Search OMDb for a title
    Search { query: String },
    /// Analyze the selected movies and suggest new ones
    Analyze {
        /// Write the word-cloud chart option (ECharts JSON) here
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Show the titles in a list
    List { list: ListType },
    /// File a title under a list
    Add { title: String, list: ListType },
    /// Take a title off a list
    Remove { title: String, list: ListType },
    /// Show which lists a title is in
    Status { title: String },
    /// Show stored details for a title
    Show { title: String },
    /// Drop details for titles that are in no list
    Prune,
    /// Lay out a backdrop of randomly picked classic posters
    Backdrop,
}

pub struct App {
    lists: ListStore,
    session: Box<dyn KeyValueStore>,
    notifications: Arc<NotificationCenter>,
    cards: Arc<CardBoard>,
    metadata: Option<Arc<dyn MetadataProvider>>,
    analysis: Option<Arc<dyn AnalysisProvider>>,
}

impl App {
    /// Opens storage and providers as configured
    ///
    /// A provider whose API key is not set stays unavailable; commands that
    /// need it fail with a configuration error.
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let backend = open_store(&config)?;
        let session = open_session_store(&config.session_dir()).with_context(|| {
            format!(
                "opening session store in {}",
                config.session_dir().display()
            )
        })?;

        let metadata = config.omdb_api_key.clone().map(|key| {
            Arc::new(OmdbProvider::new(key, config.omdb_api_url.clone()))
                as Arc<dyn MetadataProvider>
        });
        let analysis = config.gemini_api_key.clone().map(|key| {
            Arc::new(GeminiProvider::new(
                key,
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            )) as Arc<dyn AnalysisProvider>
        });

        Ok(Self::new(backend, Box::new(session), metadata, analysis))
    }

    pub fn new(
        backend: Box<dyn KeyValueStore>,
        session: Box<dyn KeyValueStore>,
        metadata: Option<Arc<dyn MetadataProvider>>,
        analysis: Option<Arc<dyn AnalysisProvider>>,
    ) -> Self {
        let notifications = Arc::new(NotificationCenter::new());
        let cards = Arc::new(CardBoard::new());

        let mut lists = ListStore::new(backend);
        lists.subscribe(notifications.clone());
        lists.subscribe(cards.clone());

        Self {
            lists,
            session,
            notifications,
            cards,
            metadata,
            analysis,
        }
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    /// Runs one command, writing its output to `out`
    pub async fn run(&self, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
        match command {
            Command::Select { titles } => self.select(&titles, out)?,
            Command::Search { query } => self.search(&query, out).await?,
            Command::Analyze { chart } => self.analyze(chart, out).await?,
            Command::List { list } => self.list(list, out)?,
            Command::Add { title, list } => self.add(title.trim(), list, out).await?,
            Command::Remove { title, list } => self.remove(title.trim(), list, out)?,
            Command::Status { title } => self.status(title.trim(), out)?,
            Command::Show { title } => self.show(title.trim(), out)?,
            Command::Prune => {
                let pruned = self.lists.prune_details();
                writeln!(out, "Pruned {} details entries", pruned)?;
            }
            Command::Backdrop => {
                let placed = posters::backdrop(self.metadata_provider()?).await;
                write_posters(&placed, out)?;
            }
        }

        self.flush_notifications(out)
    }

    fn metadata_provider(&self) -> Result<Arc<dyn MetadataProvider>, AppError> {
        self.metadata
            .clone()
            .ok_or_else(|| AppError::Config("OMDB_API_KEY is not set".to_string()))
    }

    fn analysis_provider(&self) -> Result<Arc<dyn AnalysisProvider>, AppError> {
        self.analysis
            .clone()
            .ok_or_else(|| AppError::Config("GEMINI_API_KEY is not set".to_string()))
    }

    fn select(&self, titles: &[String], out: &mut dyn Write) -> anyhow::Result<()> {
        let selection = MovieSelection::from_inputs(titles)
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        selection.save(self.session.as_ref())?;

        writeln!(out, "Selected: {}", selection.titles().join(", "))?;
        Ok(())
    }

    async fn search(&self, query: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let provider = self.metadata_provider()?;
        let hits = match provider.search(query).await {
            Ok(hits) => hits,
            Err(AppError::NotFound(msg)) => {
                writeln!(out, "{}", msg)?;
                return Ok(());
            }
            Err(e) => return Err(anyhow::anyhow!(e.user_message())),
        };

        for hit in hits {
            writeln!(out, "{} ({}) {}", hit.title, hit.year, hit.imdb_id)?;
        }
        Ok(())
    }

    async fn analyze(&self, chart: Option<PathBuf>, out: &mut dyn Write) -> anyhow::Result<()> {
        let analyzer = Analyzer::new(self.analysis_provider()?, self.metadata_provider()?);
        let selection = MovieSelection::load(self.session.as_ref());

        let analysis = analyzer
            .run(&selection)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        if let Err(e) = analysis.save(self.session.as_ref()) {
            tracing::warn!(error = %e, "Failed to store analysis in session");
        }

        self.render_analysis(&analysis, out)?;

        if let Some(path) = chart {
            match &analysis.chart {
                Some(option) => {
                    std::fs::write(&path, serde_json::to_string_pretty(option)?)
                        .with_context(|| format!("writing chart to {}", path.display()))?;
                    writeln!(out, "Word cloud written to {}", path.display())?;
                }
                None => writeln!(out, "No keywords to draw a word cloud from")?,
            }
        }

        Ok(())
    }

    fn render_analysis(&self, analysis: &Analysis, out: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(out, "Analysis of {}", analysis.movies.join(", "))?;
        writeln!(out)?;
        writeln!(out, "{}", analysis.result.common_points_or_default())?;

        if !analysis.result.keywords.is_empty() {
            writeln!(out)?;
            writeln!(out, "Keywords")?;
            for keyword in ranked(&analysis.result.keywords) {
                writeln!(
                    out,
                    "  {:<24} {:>5.0}  {}",
                    keyword.name, keyword.value, keyword.category
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Recommended Movies")?;
        let mut carded = HashSet::new();
        for rec in &analysis.result.recommendations {
            writeln!(out, "{}: {}", rec.title, rec.reason)?;
            if !carded.insert(rec.title.as_str()) {
                continue;
            }

            let details = analysis.details.get(&rec.title).cloned();
            self.cards
                .register(&rec.title, details, self.lists.membership(&rec.title));
            if let Some(card) = self.cards.cards_for(&rec.title).last() {
                writeln!(out, "  {}", card.render().replace('\n', "\n  "))?;
            }
        }

        if !analysis.posters.is_empty() {
            writeln!(out)?;
            write_posters(&analysis.posters, out)?;
        }

        Ok(())
    }

    fn list(&self, list: ListType, out: &mut dyn Write) -> anyhow::Result<()> {
        let titles = self.lists.get(list);
        if titles.is_empty() {
            writeln!(out, "Your {} is empty", list)?;
            return Ok(());
        }

        let details = self.lists.details_table();
        for title in titles {
            match details.get(&title).map(MovieDetails::summary) {
                Some(summary) if !summary.is_empty() => writeln!(out, "{} ({})", title, summary)?,
                _ => writeln!(out, "{}", title)?,
            }
        }
        Ok(())
    }

    /// Details for `title`: the last analysis first, OMDb second
    async fn lookup_details(&self, title: &str) -> Option<MovieDetails> {
        if let Some(details) = Analysis::load(self.session.as_ref())
            .and_then(|mut analysis| analysis.details.remove(title))
        {
            return Some(details);
        }

        let provider = self.metadata.as_ref()?;
        details_for_title(provider.as_ref(), title).await
    }

    async fn add(&self, title: &str, list: ListType, out: &mut dyn Write) -> anyhow::Result<()> {
        let details = self.lookup_details(title).await;
        self.cards
            .register(title, details.clone(), self.lists.membership(title));

        let added = self.lists.set_status(title, list, details);
        if !added && !self.lists.is_in_list(title, list) {
            anyhow::bail!("Could not add \"{}\" to {}", title, list);
        }

        self.print_card(title, out)
    }

    fn remove(&self, title: &str, list: ListType, out: &mut dyn Write) -> anyhow::Result<()> {
        if !self.lists.remove(title, list) {
            writeln!(out, "\"{}\" is not in your {}", title, list)?;
        }
        Ok(())
    }

    fn status(&self, title: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        self.cards
            .register(title, self.lists.details(title), self.lists.membership(title));
        self.print_card(title, out)
    }

    /// Prints the card registered last for `title`
    fn print_card(&self, title: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        if let Some(card) = self.cards.cards_for(title).last() {
            writeln!(out, "{}", card.render())?;
        }
        Ok(())
    }

    fn show(&self, title: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some(details) = self.lists.details(title) else {
            writeln!(out, "No details stored for \"{}\"", title)?;
            return Ok(());
        };

        writeln!(out, "{}", title)?;
        for (label, value) in [
            ("Year", &details.year),
            ("Genre", &details.genre),
            ("Rating", &details.rating),
            ("IMDb", &details.imdb_id),
            ("Poster", &details.poster),
            ("Plot", &details.plot),
        ] {
            if !value.is_empty() {
                writeln!(out, "  {:<7} {}", label, value)?;
            }
        }
        Ok(())
    }

    fn flush_notifications(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        for notification in self.notifications.drain() {
            let mark = match notification.kind {
                NotificationKind::Success => "✓",
                NotificationKind::Info => "i",
            };
            writeln!(out, "{} {}", mark, notification.message)?;
        }
        Ok(())
    }
}

fn write_posters(placed: &[PlacedPoster], out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "Posters")?;
    for poster in placed {
        writeln!(
            out,
            "  {} at ({}%, {}%) rotated {}°: {}",
            poster.title,
            poster.slot.x,
            poster.slot.y,
            poster.slot.rotation,
            poster.poster_url
        )?;
    }
    Ok(())
}
