//! Canned content that keeps the app useful without any model backend:
//! the quiz question bank, tutor greeting and keyword rules, and the demo
//! summary.

use crate::domain::Question;

pub const TUTOR_GREETING: &str = "Hello! I'm your AI study tutor. I'm here to help you understand any topic, answer questions, and guide your learning. What would you like to learn about today?";

pub const TUTOR_APOLOGY: &str = "I'm sorry, I encountered an error. Please try again.";

/// Keyword rules for the scripted tutor. First rule with any matching
/// keyword (on lower-cased input) wins.
pub const TUTOR_RULES: &[(&[&str], &str)] = &[
  (
    &["hello", "hi"],
    "Hello! I'm excited to help you learn! What subject or topic would you like to explore today?",
  ),
  (
    &["math", "mathematics"],
    "Mathematics is a fascinating subject! I can help you with algebra, calculus, geometry, statistics, or any other math topic. What specific area would you like to work on?",
  ),
  (
    &["science", "physics", "chemistry", "biology"],
    "Science is all about understanding the world around us! I can explain concepts in physics, chemistry, biology, or any other scientific field. What would you like to learn about?",
  ),
  (
    &["history"],
    "History helps us understand how we got to where we are today. I can discuss any historical period, events, or figures. What historical topic interests you?",
  ),
  (
    &["explain", "what is", "how does"],
    "I'd be happy to explain that! Could you provide more specific details about what you'd like me to clarify? The more context you give me, the better I can help you understand.",
  ),
  (
    &["help", "confused"],
    "Don't worry, I'm here to help! Learning can be challenging, but breaking things down into smaller parts often helps. What specific concept are you struggling with?",
  ),
  (
    &["study", "studying"],
    "Great question! Effective studying involves active learning techniques. Try methods like summarizing in your own words, creating flashcards, teaching someone else, or practicing with problems. What study method would you like to explore?",
  ),
];

pub fn tutor_default_reply(input: &str) -> String {
  format!(
    "That's an interesting question! I'd love to help you understand \"{}\". Could you provide a bit more context or let me know what specific aspect you'd like me to focus on? I'm here to make learning easier and more engaging for you!",
    input
  )
}

pub const DEMO_TEXT: &str = "Machine learning is a subset of artificial intelligence that focuses on algorithms and statistical models that enable computer systems to improve their performance on a specific task through experience. Unlike traditional programming where explicit instructions are given, machine learning systems learn patterns from data.

There are three main types of machine learning:
1. Supervised Learning: Uses labeled training data to learn a mapping from inputs to outputs
2. Unsupervised Learning: Finds hidden patterns in data without labeled examples
3. Reinforcement Learning: Learns through interaction with an environment using rewards and penalties

Key concepts include:
- Training data: The dataset used to teach the model
- Features: Input variables used to make predictions
- Model: The algorithm that makes predictions
- Overfitting: When a model performs well on training data but poorly on new data
- Cross-validation: Technique to evaluate model performance";

pub const DEMO_SUMMARY: &str = "**Machine Learning Overview**

Machine learning is an AI subset that enables computers to improve performance through experience rather than explicit programming.

**Three Main Types:**
• **Supervised Learning**: Uses labeled data to learn input-output mappings
• **Unsupervised Learning**: Discovers hidden patterns without labeled examples
• **Reinforcement Learning**: Learns through environment interaction using rewards/penalties

**Key Concepts:**
• Training data teaches the model
• Features are input variables for predictions
• Models are prediction algorithms
• Overfitting occurs when models perform well on training data but poorly on new data
• Cross-validation evaluates model performance

**Summary**: Machine learning automates pattern recognition and decision-making by learning from data rather than following predetermined rules.";

fn question(id: &str, text: &str, options: [&str; 4], correct: usize, explanation: &str) -> Question {
  Question {
    id: id.into(),
    question: text.into(),
    options: options.iter().map(|o| o.to_string()).collect(),
    correct_answer: correct,
    explanation: explanation.into(),
  }
}

/// The canned machine-learning question bank, large enough for the biggest
/// allowed quiz.
pub fn question_bank() -> Vec<Question> {
  vec![
    question(
      "1",
      "What is machine learning primarily focused on?",
      [
        "Following explicit programming instructions",
        "Learning patterns from data through experience",
        "Storing large amounts of information",
        "Creating visual interfaces",
      ],
      1,
      "Machine learning focuses on algorithms that learn patterns from data rather than following explicit instructions.",
    ),
    question(
      "2",
      "Which of the following is NOT a type of machine learning?",
      ["Supervised Learning", "Unsupervised Learning", "Reinforcement Learning", "Manual Learning"],
      3,
      "Manual Learning is not a recognized type of machine learning. The three main types are supervised, unsupervised, and reinforcement learning.",
    ),
    question(
      "3",
      "What does overfitting refer to in machine learning?",
      [
        "When a model performs well on training data but poorly on new data",
        "When a model learns too slowly",
        "When a model has too few parameters",
        "When a model is too simple",
      ],
      0,
      "Overfitting occurs when a model memorizes the training data but fails to generalize to new, unseen data.",
    ),
    question(
      "4",
      "What is the purpose of cross-validation?",
      [
        "To increase the size of the training dataset",
        "To evaluate model performance",
        "To speed up the training process",
        "To reduce computational costs",
      ],
      1,
      "Cross-validation is a technique used to evaluate how well a model will generalize to new data.",
    ),
    question(
      "5",
      "In supervised learning, what are features?",
      [
        "The output predictions",
        "Input variables used to make predictions",
        "The training algorithm",
        "The evaluation metrics",
      ],
      1,
      "Features are the input variables or attributes that the model uses to make predictions.",
    ),
    question(
      "6",
      "What distinguishes supervised learning from unsupervised learning?",
      [
        "Supervised learning needs no data",
        "Supervised learning uses labeled training examples",
        "Unsupervised learning always uses rewards",
        "Unsupervised learning requires a human in the loop",
      ],
      1,
      "Supervised learning learns a mapping from inputs to known outputs, which requires labeled examples.",
    ),
    question(
      "7",
      "Which task is a typical example of unsupervised learning?",
      [
        "Predicting house prices from past sales",
        "Classifying emails as spam or not spam",
        "Grouping customers by purchasing behavior",
        "Playing a game to maximize a score",
      ],
      2,
      "Clustering customers finds hidden structure in unlabeled data, which is the goal of unsupervised learning.",
    ),
    question(
      "8",
      "How does a reinforcement learning agent learn?",
      [
        "By copying labeled answers",
        "By interacting with an environment and receiving rewards or penalties",
        "By memorizing the full dataset",
        "By following hand-written rules",
      ],
      1,
      "Reinforcement learning improves a policy through trial and error guided by rewards and penalties.",
    ),
    question(
      "9",
      "What is training data?",
      [
        "The dataset used to teach the model",
        "Data the model has never seen",
        "The model's final predictions",
        "A list of algorithm names",
      ],
      0,
      "Training data is the set of examples the model learns its patterns from.",
    ),
    question(
      "10",
      "In machine learning, what is a model?",
      [
        "A visual chart of the data",
        "The hardware used for training",
        "The algorithm that makes predictions",
        "A spreadsheet of labels",
      ],
      2,
      "A model is the learned function or algorithm that turns inputs into predictions.",
    ),
    question(
      "11",
      "Which practice helps reduce overfitting?",
      [
        "Training longer on the same small dataset",
        "Adding more relevant training data",
        "Removing the validation set",
        "Increasing model complexity without limit",
      ],
      1,
      "More representative data makes it harder for the model to memorize noise, improving generalization.",
    ),
    question(
      "12",
      "Why is data held out from training for evaluation?",
      [
        "To make training faster",
        "To estimate performance on unseen data",
        "To store backups of the dataset",
        "To increase the number of features",
      ],
      1,
      "Held-out data simulates new inputs, so performance on it estimates how the model generalizes.",
    ),
    question(
      "13",
      "What does a label represent in supervised learning?",
      [
        "The expected output for an example",
        "The name of the dataset file",
        "A hyperparameter of the model",
        "The number of training steps",
      ],
      0,
      "Labels are the known answers the model is trained to predict.",
    ),
    question(
      "14",
      "Unlike traditional programming, machine learning systems...",
      [
        "Need every rule written explicitly",
        "Cannot work with numbers",
        "Learn patterns from data instead of explicit instructions",
        "Only run on specialized hardware",
      ],
      2,
      "Traditional programs encode explicit rules; machine learning infers them from examples.",
    ),
    question(
      "15",
      "Machine learning is best described as a subset of which field?",
      ["Database design", "Artificial intelligence", "Computer graphics", "Networking"],
      1,
      "Machine learning is a branch of artificial intelligence focused on learning from experience.",
    ),
  ]
}

/// First `count` questions of the bank, cycling with fresh ids if a caller
/// asks for more than the bank holds.
pub fn canned_questions(count: usize) -> Vec<Question> {
  let bank = question_bank();
  (0..count)
    .map(|i| {
      let mut q = bank[i % bank.len()].clone();
      q.id = (i + 1).to_string();
      q
    })
    .collect()
}
