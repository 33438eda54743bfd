//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use grievance_assistant::KnowledgeBase;
use grievance_complaint_models::{
    Complaint, ComplaintCategory, ComplaintPriority, ComplaintStatus, NewComplaint,
};
use grievance_priority::keywords::KeywordTables;
use grievance_priority::providers::file::FileImageDecoder;
use grievance_priority::providers::static_labels::{NoModelProvider, StaticLabelProvider};
use grievance_priority::vision::{ImageRef, ModelProvider};
use grievance_priority::{EmergencyPredictor, PriorityAssessment};
use grievance_store::{ComplaintStore, MemoryStore, ProfileStore};
use grievance_submission::SubmissionService;
use grievance_workflow::Workflow;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Loaded store plus the settings every command needs.
pub struct Context {
    store_path: PathBuf,
    store: Arc<MemoryStore>,
    tables: Option<KeywordTables>,
}

impl Context {
    /// Loads the snapshot at `store_path` and the optional keyword tables.
    pub async fn open(
        store_path: PathBuf,
        keywords: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let tables = keywords
            .map(|path| KeywordTables::from_path(&path))
            .transpose()?;
        let store = Arc::new(MemoryStore::load(&store_path).await?);

        Ok(Self {
            store_path,
            store,
            tables,
        })
    }

    async fn persist(&self) -> CommandResult {
        self.store.save(&self.store_path).await?;
        Ok(())
    }

    async fn predictor(&self, predictions: Option<PathBuf>) -> Arc<EmergencyPredictor> {
        let has_model = predictions.is_some();
        let provider: Arc<dyn ModelProvider> = match predictions {
            Some(path) => Arc::new(StaticLabelProvider::new(path)),
            None => Arc::new(NoModelProvider),
        };
        let mut predictor = EmergencyPredictor::new(provider, Arc::new(FileImageDecoder::new()));
        if let Some(tables) = &self.tables {
            predictor = predictor.with_tables(tables.clone());
        }

        if has_model {
            predictor.init().await;
        }
        Arc::new(predictor)
    }

    fn workflow(&self) -> Workflow {
        Workflow::new(self.store.clone())
    }

    pub async fn classify(
        &self,
        description: &str,
        category: ComplaintCategory,
        image: Option<String>,
        predictions: Option<PathBuf>,
    ) -> CommandResult {
        let predictor = self.predictor(predictions).await;
        let image = image.map(image_ref);
        let assessment = predictor
            .assess(description, category.as_ref(), image.as_ref())
            .await;

        print_assessment(&assessment);
        Ok(())
    }

    pub async fn submit(
        &self,
        new: NewComplaint,
        image: Option<String>,
        predictions: Option<PathBuf>,
    ) -> CommandResult {
        let predictor = self.predictor(predictions).await;
        let service = SubmissionService::new(self.store.clone(), predictor);

        let outcome = service.submit(new, image.map(image_ref)).await?;
        self.persist().await?;

        if let Some(duplicate) = &outcome.duplicate {
            println!(
                "Note: a similar complaint is already open at {} (id {}).",
                duplicate.address, duplicate.complaint_id
            );
        }
        print_assessment(&outcome.assessment);
        println!("{}", serde_json::to_string_pretty(&outcome.complaint)?);
        Ok(())
    }

    pub async fn list(
        &self,
        status: Option<ComplaintStatus>,
        category: Option<ComplaintCategory>,
    ) -> CommandResult {
        let complaints = self.store.list().await?;
        let matching = grievance_analytics::filter(&complaints, status, category);

        println!(
            "{:<38} {:<18} {:<8} {:<18} ADDRESS",
            "ID", "CATEGORY", "PRIORITY", "STATUS"
        );
        println!("{}", "-".repeat(100));
        for c in &matching {
            println!(
                "{:<38} {:<18} {:<8} {:<18} {}",
                c.id, c.category, c.priority, c.status, c.location.address
            );
        }
        println!("\n{} complaint(s)", matching.len());
        Ok(())
    }

    pub async fn dashboard(&self) -> CommandResult {
        let complaints = self.store.list().await?;

        if let Some(alert) = grievance_analytics::urgent_alert(&complaints) {
            println!("!! {alert}\n");
        }
        let stats = grievance_analytics::dashboard(&complaints);
        println!("{}", serde_json::to_string_pretty(&stats)?);
        Ok(())
    }

    pub async fn billboard(&self) -> CommandResult {
        let complaints = self.store.list().await?;
        let entries = grievance_analytics::billboard(&complaints, chrono::Utc::now());

        if entries.is_empty() {
            println!("No outstanding complaints.");
            return Ok(());
        }
        for entry in &entries {
            println!(
                "[{} days] {} | {} | {}",
                entry.days_open, entry.authority, entry.address, entry.description
            );
        }
        Ok(())
    }

    pub async fn leaderboard(&self) -> CommandResult {
        let now = chrono::Utc::now();
        let complaints = self.store.list().await?;
        let profiles = self.store.profiles().await?;
        let entries = grievance_analytics::leaderboard(&complaints, &profiles, now);

        println!("Top reporters for {}", grievance_analytics::quarter_label(now));
        for (rank, entry) in entries.iter().enumerate() {
            println!("{:>3}. {:<30} {}", rank + 1, entry.full_name, entry.count);
        }
        Ok(())
    }

    pub async fn assign(&self, id: &str, worker: &str) -> CommandResult {
        let complaint = self.workflow().assign_worker(id, worker).await?;
        self.finish(&complaint).await
    }

    pub async fn complete(&self, id: &str, image_url: &str) -> CommandResult {
        let complaint = self.workflow().complete_task(id, image_url).await?;
        self.finish(&complaint).await
    }

    pub async fn approve(&self, id: &str) -> CommandResult {
        let complaint = self.workflow().approve(id).await?;
        self.finish(&complaint).await
    }

    pub async fn reassign(&self, id: &str) -> CommandResult {
        let complaint = self.workflow().reassign(id).await?;
        self.finish(&complaint).await
    }

    pub async fn set_priority(&self, id: &str, priority: ComplaintPriority) -> CommandResult {
        let complaint = self.workflow().override_priority(id, priority).await?;
        self.finish(&complaint).await
    }

    pub async fn set_status(&self, id: &str, status: ComplaintStatus) -> CommandResult {
        let complaint = self.workflow().update_status(id, status).await?;
        self.finish(&complaint).await
    }

    pub async fn delete(&self, id: &str) -> CommandResult {
        self.workflow().delete(id).await?;
        self.persist().await?;
        println!("Deleted {id}");
        Ok(())
    }

    async fn finish(&self, complaint: &Complaint) -> CommandResult {
        self.persist().await?;
        println!("{} is now {} ({})", complaint.id, complaint.status, complaint.priority);
        Ok(())
    }
}

/// Answers a help question. Needs no store.
pub fn ask(question: &str, knowledge: Option<&Path>) -> CommandResult {
    let kb = match knowledge {
        Some(path) => KnowledgeBase::from_path(path)?,
        None => KnowledgeBase::default(),
    };
    println!("{}", kb.answer(question));
    Ok(())
}

fn image_ref(image: String) -> ImageRef {
    if image.contains("://") {
        ImageRef::Uri(image)
    } else {
        ImageRef::Path(PathBuf::from(image))
    }
}

fn print_assessment(assessment: &PriorityAssessment) {
    println!(
        "Priority: {} (text {} + visual {} = {})",
        assessment.priority,
        assessment.text_score,
        assessment.visual_score,
        assessment.total()
    );
}
